use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::error::FetchError;
use crate::http_cache::{fetch_html, fetch_html_cached};
use crate::http_client::http_client;

const RENDER_POLL: Duration = Duration::from_millis(50);
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        (**self).fetch(url, timeout)
    }
}

impl<F: PageFetcher + ?Sized> PageFetcher for Box<F> {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        (**self).fetch(url, timeout)
    }
}

pub fn fetcher_from_config(config: &CrawlConfig) -> Box<dyn PageFetcher> {
    match config.render_command.as_deref() {
        Some(command) => {
            info!("fetching pages through render command `{command}`");
            Box::new(RenderedPageFetcher::new(command))
        }
        None => {
            warn!("no render command configured; using plain http");
            Box::new(HttpPageFetcher::new(config.page_cache))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpPageFetcher {
    cache: bool,
}

impl HttpPageFetcher {
    pub fn new(cache: bool) -> Self {
        Self { cache }
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let client = http_client().map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("{e:#}"),
        })?;
        info!("fetching {url}");
        let markup = if self.cache {
            fetch_html_cached(client, url, timeout)?
        } else {
            fetch_html(client, url, timeout)?
        };
        Ok(uncomment_tables(&markup))
    }
}

/// fbref ships most tables inside HTML comments and swaps them in from script.
pub fn uncomment_tables(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(open) = rest.find(COMMENT_OPEN) {
        let body_start = open + COMMENT_OPEN.len();
        let Some(close) = rest[body_start..].find(COMMENT_CLOSE) else {
            break;
        };
        let body_end = body_start + close;
        let block_end = body_end + COMMENT_CLOSE.len();
        let body = &rest[body_start..body_end];
        if body.contains("<table") {
            out.push_str(&rest[..open]);
            out.push_str(body);
        } else {
            out.push_str(&rest[..block_end]);
        }
        rest = &rest[block_end..];
    }
    out.push_str(rest);
    out
}

/// Runs an external headless browser (for example
/// `chromium --headless --dump-dom`) with the URL as its last argument and
/// takes the rendered DOM from stdout.
#[derive(Debug, Clone)]
pub struct RenderedPageFetcher {
    program: String,
    args: Vec<String>,
}

impl RenderedPageFetcher {
    pub fn new(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
        }
    }
}

impl PageFetcher for RenderedPageFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let navigation = |message: String| FetchError::Navigation {
            url: url.to_string(),
            message,
        };
        if self.program.is_empty() {
            return Err(navigation("render command is empty".to_string()));
        }

        info!("rendering {url}");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| navigation(format!("spawn {}: {e}", self.program)))?;

        let Some(mut stdout) = child.stdout.take() else {
            kill_and_reap(&mut child);
            return Err(navigation("render command has no stdout".to_string()));
        };
        // Drain stdout on its own thread so a full pipe cannot stall the child.
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= timeout => {
                    kill_and_reap(&mut child);
                    return Err(FetchError::Timeout {
                        url: url.to_string(),
                        after: timeout,
                    });
                }
                Ok(None) => thread::sleep(RENDER_POLL),
                Err(e) => {
                    kill_and_reap(&mut child);
                    return Err(navigation(format!("wait for renderer: {e}")));
                }
            }
        };

        let output = reader
            .join()
            .map_err(|_| navigation("render output reader panicked".to_string()))?
            .map_err(|e| navigation(format!("read render output: {e}")))?;
        if !status.success() {
            return Err(navigation(format!("renderer exited with {status}")));
        }
        debug!("rendered {url} ({} bytes)", output.len());
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
