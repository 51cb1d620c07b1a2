use crate::record_set::RecordSet;
use crate::team::TeamSeasonRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDataset {
    pub rows: RecordSet,
    pub teams: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    Dataset(MatchDataset),
    Empty,
}

pub fn aggregate(records: &[TeamSeasonRecord]) -> Aggregate {
    if records.is_empty() {
        return Aggregate::Empty;
    }
    let sets: Vec<&RecordSet> = records.iter().map(|r| &r.rows).collect();
    let mut rows = RecordSet::concat(&sets);
    rows.lowercase_columns();
    Aggregate::Dataset(MatchDataset {
        rows,
        teams: records.len(),
    })
}
