//! Per-session statement statistics.

use serde::{Deserialize, Serialize};

/// Statement categories counted per session, in persisted column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatCategory {
    UseDb,
    Delete,
    Insert,
    Update,
    Select,
    AlterTable,
    Rename,
    CreateIndex,
    DropIndex,
    AddColumn,
    DropColumn,
    ChangeColumn,
    AlterOption,
    AlterConvert,
    CreateTable,
    DropTable,
    CreateDb,
    Truncate,
}

impl StatCategory {
    pub const ALL: [StatCategory; 18] = [
        Self::UseDb,
        Self::Delete,
        Self::Insert,
        Self::Update,
        Self::Select,
        Self::AlterTable,
        Self::Rename,
        Self::CreateIndex,
        Self::DropIndex,
        Self::AddColumn,
        Self::DropColumn,
        Self::ChangeColumn,
        Self::AlterOption,
        Self::AlterConvert,
        Self::CreateTable,
        Self::DropTable,
        Self::CreateDb,
        Self::Truncate,
    ];

    /// Persisted column name.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::UseDb => "usedb",
            Self::Delete => "deleting",
            Self::Insert => "inserting",
            Self::Update => "updating",
            Self::Select => "selecting",
            Self::AlterTable => "altertable",
            Self::Rename => "renaming",
            Self::CreateIndex => "createindex",
            Self::DropIndex => "dropindex",
            Self::AddColumn => "addcolumn",
            Self::DropColumn => "dropcolumn",
            Self::ChangeColumn => "changecolumn",
            Self::AlterOption => "alteroption",
            Self::AlterConvert => "alterconvert",
            Self::CreateTable => "createtable",
            Self::DropTable => "droptable",
            Self::CreateDb => "createdb",
            Self::Truncate => "truncating",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// The 18 statement counters of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatisticsCounters {
    counts: [u64; 18],
}

impl StatisticsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, category: StatCategory) {
        self.counts[category.slot()] += 1;
    }

    pub fn get(&self, category: StatCategory) -> u64 {
        self.counts[category.slot()]
    }

    pub fn set(&mut self, category: StatCategory, value: u64) {
        self.counts[category.slot()] = value;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(category, count)` pairs in persisted column order.
    pub fn iter(&self) -> impl Iterator<Item = (StatCategory, u64)> + '_ {
        StatCategory::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}
