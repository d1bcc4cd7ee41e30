//! Column types

use crate::cell::CellValue;
use crate::coerce;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// The type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ColumnType {
    Text,
    Number,
    Date,
    Checkbox,
    Url,
    Email,
    Phone,
    Person,
    Files,
    Select,
    MultiSelect,
    Relation,
    Rollup,
    Formula,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
}

impl ColumnType {
    /// All column types, in declaration order
    pub const ALL: [ColumnType; 18] = [
        ColumnType::Text,
        ColumnType::Number,
        ColumnType::Date,
        ColumnType::Checkbox,
        ColumnType::Url,
        ColumnType::Email,
        ColumnType::Phone,
        ColumnType::Person,
        ColumnType::Files,
        ColumnType::Select,
        ColumnType::MultiSelect,
        ColumnType::Relation,
        ColumnType::Rollup,
        ColumnType::Formula,
        ColumnType::CreatedTime,
        ColumnType::CreatedBy,
        ColumnType::LastEditedTime,
        ColumnType::LastEditedBy,
    ];

    /// Get the wire name for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Checkbox => "checkbox",
            ColumnType::Url => "url",
            ColumnType::Email => "email",
            ColumnType::Phone => "phone",
            ColumnType::Person => "person",
            ColumnType::Files => "files",
            ColumnType::Select => "select",
            ColumnType::MultiSelect => "multiSelect",
            ColumnType::Relation => "relation",
            ColumnType::Rollup => "rollup",
            ColumnType::Formula => "formula",
            ColumnType::CreatedTime => "createdTime",
            ColumnType::CreatedBy => "createdBy",
            ColumnType::LastEditedTime => "lastEditedTime",
            ColumnType::LastEditedBy => "lastEditedBy",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Formula and rollup columns derive their value instead of storing it
    pub fn is_computed(&self) -> bool {
        matches!(self, ColumnType::Formula | ColumnType::Rollup)
    }

    /// Columns maintained by the system rather than the user
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            ColumnType::CreatedTime
                | ColumnType::CreatedBy
                | ColumnType::LastEditedTime
                | ColumnType::LastEditedBy
        )
    }

    /// Check whether a raw value is a legal stored shape for this type
    ///
    /// Null is legal everywhere. Computed columns accept any shape, since a
    /// stored value there is only a fallback.
    pub fn accepts(&self, value: &CellValue) -> bool {
        match (self, value) {
            (_, CellValue::Null) => true,
            (t, _) if t.is_computed() => true,
            (ColumnType::Number, CellValue::Number(_)) => true,
            (ColumnType::Checkbox, CellValue::Boolean(_)) => true,
            (
                ColumnType::Date | ColumnType::CreatedTime | ColumnType::LastEditedTime,
                CellValue::Timestamp(_) | CellValue::Text(_),
            ) => true,
            (
                ColumnType::MultiSelect | ColumnType::Relation | ColumnType::Files,
                CellValue::List(_),
            ) => true,
            (ColumnType::Relation | ColumnType::Person, CellValue::Text(_)) => true,
            (
                ColumnType::Text
                | ColumnType::Url
                | ColumnType::Email
                | ColumnType::Phone
                | ColumnType::Select
                | ColumnType::CreatedBy
                | ColumnType::LastEditedBy,
                CellValue::Text(_),
            ) => true,
            (ColumnType::Person, CellValue::List(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice of a select or multi-select column
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectOption {
    pub id: String,
    pub label: String,
    pub color: String,
}

impl SelectOption {
    /// Create a new option
    pub fn new(id: impl Into<String>, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Options of a relation column
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct RelationOptions {
    /// Table the stored row ids point into
    pub related_table_id: Option<String>,
    /// Cached display name of that table
    pub related_table_name: Option<String>,
}

/// Options of a formula column
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct FormulaOptions {
    /// Formula text as the user wrote it
    pub source: String,
    /// Referenced display name → column id, recorded when the formula was saved
    pub references: BTreeMap<String, String>,
}

impl FormulaOptions {
    /// Options for a formula without id bindings
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            references: BTreeMap::new(),
        }
    }

    /// A formula is configured once its source has non-whitespace content
    pub fn has_valid_config(&self) -> bool {
        !self.source.trim().is_empty()
    }
}

/// Aggregation applied by a rollup column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Aggregation {
    /// Number of linked rows
    Count,
    /// Number of non-empty values
    CountValues,
    /// Number of distinct non-empty values
    CountUnique,
    Sum,
    Average,
    Min,
    Max,
    /// The values themselves, joined for display
    ShowOriginal,
}

impl Aggregation {
    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::CountValues => "countValues",
            Aggregation::CountUnique => "countUnique",
            Aggregation::Sum => "sum",
            Aggregation::Average => "average",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::ShowOriginal => "showOriginal",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "count" => Some(Aggregation::Count),
            "countValues" => Some(Aggregation::CountValues),
            "countUnique" => Some(Aggregation::CountUnique),
            "sum" => Some(Aggregation::Sum),
            "average" => Some(Aggregation::Average),
            "min" => Some(Aggregation::Min),
            "max" => Some(Aggregation::Max),
            "showOriginal" => Some(Aggregation::ShowOriginal),
            _ => None,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options of a rollup column
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct RollupOptions {
    /// Relation column (same table) whose linked rows are aggregated
    pub relation_column_id: Option<String>,
    /// Column name in the related table to read
    pub target_property_name: Option<String>,
    pub aggregation: Option<Aggregation>,
}

impl RollupOptions {
    /// Create fully configured rollup options
    pub fn new(
        relation_column_id: impl Into<String>,
        target_property_name: impl Into<String>,
        aggregation: Aggregation,
    ) -> Self {
        Self {
            relation_column_id: Some(relation_column_id.into()),
            target_property_name: Some(target_property_name.into()),
            aggregation: Some(aggregation),
        }
    }

    /// All three settings must be present (and non-blank) before evaluation
    pub fn has_valid_config(&self) -> bool {
        let set = |s: &Option<String>| s.as_deref().map_or(false, |s| !s.is_empty());
        set(&self.relation_column_id)
            && set(&self.target_property_name)
            && self.aggregation.is_some()
    }
}

/// Type-dependent column options
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum ColumnOptions {
    #[default]
    None,
    /// Choices of a select or multi-select column
    Select { options: Vec<SelectOption> },
    Relation(RelationOptions),
    Formula(FormulaOptions),
    Rollup(RollupOptions),
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Column {
    /// Unique within the table
    pub id: String,
    /// Display label, also the key `prop("...")` refers to
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub column_type: ColumnType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub options: ColumnOptions,
}

impl Column {
    /// Create a new column without options
    pub fn new(id: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type,
            options: ColumnOptions::None,
        }
    }

    /// Create a formula column
    pub fn formula(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::new(id, name, ColumnType::Formula)
            .with_options(ColumnOptions::Formula(FormulaOptions::new(source)))
    }

    /// Create a rollup column
    pub fn rollup(id: impl Into<String>, name: impl Into<String>, options: RollupOptions) -> Self {
        Self::new(id, name, ColumnType::Rollup).with_options(ColumnOptions::Rollup(options))
    }

    /// Create a relation column pointing at another table
    pub fn relation(
        id: impl Into<String>,
        name: impl Into<String>,
        related_table_id: impl Into<String>,
    ) -> Self {
        Self::new(id, name, ColumnType::Relation).with_options(ColumnOptions::Relation(
            RelationOptions {
                related_table_id: Some(related_table_id.into()),
                related_table_name: None,
            },
        ))
    }

    /// Create a select column with the given choices
    pub fn select(
        id: impl Into<String>,
        name: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self::new(id, name, ColumnType::Select).with_options(ColumnOptions::Select { options })
    }

    /// Set options
    pub fn with_options(mut self, options: ColumnOptions) -> Self {
        self.options = options;
        self
    }

    /// Formula options, if this is a formula column
    pub fn formula_options(&self) -> Option<&FormulaOptions> {
        match &self.options {
            ColumnOptions::Formula(opts) if self.column_type == ColumnType::Formula => Some(opts),
            _ => None,
        }
    }

    /// Rollup options, if this is a rollup column
    pub fn rollup_options(&self) -> Option<&RollupOptions> {
        match &self.options {
            ColumnOptions::Rollup(opts) if self.column_type == ColumnType::Rollup => Some(opts),
            _ => None,
        }
    }

    /// Relation options, if this is a relation column
    pub fn relation_options(&self) -> Option<&RelationOptions> {
        match &self.options {
            ColumnOptions::Relation(opts) if self.column_type == ColumnType::Relation => Some(opts),
            _ => None,
        }
    }

    /// Choices of a select / multi-select column (empty otherwise)
    pub fn select_options(&self) -> &[SelectOption] {
        match &self.options {
            ColumnOptions::Select { options } => options,
            _ => &[],
        }
    }

    /// Label of a select option id
    pub fn option_label(&self, option_id: &str) -> Option<&str> {
        self.select_options()
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.label.as_str())
    }

    /// Whether evaluation of this column should be attempted at all
    ///
    /// Only formula and rollup columns can be unconfigured. A formula or
    /// rollup column whose options are of the wrong kind counts as
    /// unconfigured.
    pub fn has_valid_config(&self) -> bool {
        match self.column_type {
            ColumnType::Formula => self
                .formula_options()
                .map_or(false, FormulaOptions::has_valid_config),
            ColumnType::Rollup => self
                .rollup_options()
                .map_or(false, RollupOptions::has_valid_config),
            _ => true,
        }
    }

    /// Replace select option ids with their labels
    ///
    /// Unknown ids are kept as-is. Non-select columns return the value
    /// unchanged.
    pub fn resolve_labels<'v>(&self, value: &'v CellValue) -> Cow<'v, CellValue> {
        if !matches!(self.column_type, ColumnType::Select | ColumnType::MultiSelect) {
            return Cow::Borrowed(value);
        }
        let label = |id: &String| self.option_label(id).unwrap_or(id.as_str()).to_string();
        match value {
            CellValue::Text(id) => Cow::Owned(CellValue::Text(label(id))),
            CellValue::List(ids) => {
                Cow::Owned(CellValue::List(ids.iter().map(|id| label(id)).collect()))
            }
            other => Cow::Borrowed(other),
        }
    }

    /// Display text of a stored value in this column
    pub fn display_value(&self, value: &CellValue) -> String {
        coerce::to_display_string(&self.resolve_labels(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn priority() -> Column {
        Column::select(
            "c-prio",
            "Priority",
            vec![
                SelectOption::new("o1", "High", "red"),
                SelectOption::new("o2", "Low", "gray"),
            ],
        )
    }

    #[test]
    fn test_column_type_names() {
        for t in ColumnType::ALL {
            assert_eq!(ColumnType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ColumnType::MultiSelect.as_str(), "multiSelect");
        assert_eq!(ColumnType::parse("Text"), None);
        assert!(ColumnType::Formula.is_computed());
        assert!(!ColumnType::Relation.is_computed());
        assert!(ColumnType::LastEditedBy.is_system());
    }

    #[test]
    fn test_accepts() {
        assert!(ColumnType::Number.accepts(&CellValue::Number(1.0)));
        assert!(ColumnType::Number.accepts(&CellValue::Null));
        assert!(!ColumnType::Number.accepts(&CellValue::text("1")));
        assert!(ColumnType::Relation.accepts(&CellValue::list(["r1"])));
        assert!(!ColumnType::Checkbox.accepts(&CellValue::Number(1.0)));
        assert!(ColumnType::Formula.accepts(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_has_valid_config() {
        assert!(Column::new("c", "Name", ColumnType::Text).has_valid_config());
        assert!(Column::formula("f", "F", "1 + 1").has_valid_config());
        assert!(!Column::formula("f", "F", "   ").has_valid_config());
        assert!(!Column::new("f", "F", ColumnType::Formula).has_valid_config());

        let full = RollupOptions::new("rel", "Amount", Aggregation::Sum);
        assert!(Column::rollup("r", "Total", full.clone()).has_valid_config());

        let partial = RollupOptions {
            aggregation: None,
            ..full
        };
        assert!(!Column::rollup("r", "Total", partial).has_valid_config());
        assert!(!RollupOptions::default().has_valid_config());
    }

    #[test]
    fn test_resolve_labels() {
        let col = priority();
        assert_eq!(col.display_value(&CellValue::text("o1")), "High");
        assert_eq!(col.display_value(&CellValue::text("gone")), "gone");

        let mut multi = col.clone();
        multi.column_type = ColumnType::MultiSelect;
        assert_eq!(
            multi.display_value(&CellValue::list(["o2", "o1"])),
            "Low, High"
        );

        let text = Column::new("t", "Notes", ColumnType::Text);
        assert_eq!(text.display_value(&CellValue::text("o1")), "o1");
    }

    #[test]
    fn test_aggregation_names() {
        for agg in [
            Aggregation::Count,
            Aggregation::CountValues,
            Aggregation::CountUnique,
            Aggregation::Sum,
            Aggregation::Average,
            Aggregation::Min,
            Aggregation::Max,
            Aggregation::ShowOriginal,
        ] {
            assert_eq!(Aggregation::parse(agg.as_str()), Some(agg));
        }
        assert_eq!(Aggregation::parse("median"), None);
    }
}
