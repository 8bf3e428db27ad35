//! Required column sets and header aliases
//!
//! Headers match case-insensitively after trimming and collapsing inner
//! whitespace. The canonical (first) name of each column is the one used by
//! the Russian plan spreadsheets and is what error messages report.

/// A column that can be located in a table header
pub trait HeaderSpec: Copy {
    /// Accepted header spellings; the first is canonical
    fn names(&self) -> &'static [&'static str];

    fn canonical(&self) -> &'static str {
        self.names()[0]
    }

    fn matches(&self, header: &str) -> bool {
        let header = normalize(header);
        self.names().iter().any(|name| normalize(name) == header)
    }
}

/// Plan columns, in template order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Stage,
    Owner,
    PlannedStart,
    PlannedEnd,
    ActualStart,
    ActualEnd,
    PlannedBudget,
    ActualBudget,
    Resources,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Stage,
        Column::Owner,
        Column::PlannedStart,
        Column::PlannedEnd,
        Column::ActualStart,
        Column::ActualEnd,
        Column::PlannedBudget,
        Column::ActualBudget,
        Column::Resources,
    ];
}

impl HeaderSpec for Column {
    fn names(&self) -> &'static [&'static str] {
        match self {
            Column::Stage => &["Этап", "stage", "stage name", "name"],
            Column::Owner => &["Ответственный", "owner", "responsible"],
            Column::PlannedStart => &["Дата начала", "planned_start", "planned start", "start"],
            Column::PlannedEnd => &["Дата окончания", "planned_end", "planned end", "end"],
            Column::ActualStart => &["Факт начала", "actual_start", "actual start"],
            Column::ActualEnd => &["Факт окончания", "actual_end", "actual end"],
            Column::PlannedBudget => &["План. бюджет", "planned_budget", "planned budget"],
            Column::ActualBudget => &["Факт. бюджет", "actual_budget", "actual budget"],
            Column::Resources => &["Ресурсы", "resources", "resource_units", "resource units"],
        }
    }
}

/// Columns of a displayed metrics table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsColumn {
    Stage,
    ScheduleDeviation,
    BudgetDeviation,
    ResourceEfficiency,
}

impl MetricsColumn {
    pub const ALL: [MetricsColumn; 4] = [
        MetricsColumn::Stage,
        MetricsColumn::ScheduleDeviation,
        MetricsColumn::BudgetDeviation,
        MetricsColumn::ResourceEfficiency,
    ];
}

impl HeaderSpec for MetricsColumn {
    fn names(&self) -> &'static [&'static str] {
        match self {
            MetricsColumn::Stage => &["Этап", "stage", "stage_name"],
            MetricsColumn::ScheduleDeviation => &["ΔT", "∆T", "schedule_deviation", "schedule_deviation_pct"],
            MetricsColumn::BudgetDeviation => &["ΔC", "∆C", "budget_deviation", "budget_deviation_pct"],
            MetricsColumn::ResourceEfficiency => &["E", "resource_efficiency", "efficiency"],
        }
    }
}

/// Lowercase, trim and collapse runs of whitespace
pub fn normalize(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
