/// Categorical filter expressions for similarity queries
use super::base::ValueObject;
use super::entities::{JobPayload, SearchHit};
use super::value_objects::CategoryField;

/// Option values that mean "no constraint" in a selector
pub const NO_CONSTRAINT_SENTINELS: [&str; 2] = ["None", "All"];

/// Interpret a raw selector value, mapping the sentinels and blank input to `None`
pub fn parse_choice(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty()
        || NO_CONSTRAINT_SENTINELS
            .iter()
            .any(|sentinel| sentinel.eq_ignore_ascii_case(value))
    {
        None
    } else {
        Some(value.to_string())
    }
}

/// One optional value per categorical field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    pub sector: Option<String>,
    pub sub_sector: Option<String>,
    pub occupation_role: Option<String>,
}

impl CategorySelection {
    pub fn get(&self, field: CategoryField) -> Option<&str> {
        match field {
            CategoryField::Sector => self.sector.as_deref(),
            CategoryField::SubSector => self.sub_sector.as_deref(),
            CategoryField::OccupationRole => self.occupation_role.as_deref(),
        }
    }

    pub fn set(&mut self, field: CategoryField, value: Option<String>) {
        match field {
            CategoryField::Sector => self.sector = value,
            CategoryField::SubSector => self.sub_sector = value,
            CategoryField::OccupationRole => self.occupation_role = value,
        }
    }

    pub fn with(mut self, field: CategoryField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        CategoryField::ALL.iter().all(|field| self.get(*field).is_none())
    }

    /// Selected (field, value) pairs in clause order
    pub fn constraints(&self) -> impl Iterator<Item = FieldConstraint> + '_ {
        CategoryField::ALL.into_iter().filter_map(move |field| {
            self.get(field).map(|value| FieldConstraint {
                field,
                value: value.to_string(),
            })
        })
    }
}

impl ValueObject for CategorySelection {}

/// Equality constraint on a single categorical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConstraint {
    pub field: CategoryField,
    pub value: String,
}

impl FieldConstraint {
    fn holds_for(&self, payload: &JobPayload) -> bool {
        payload.category(self.field) == Some(self.value.as_str())
    }
}

/// Conjunction of required and forbidden equality constraints
///
/// A field appearing in both lists with contradictory values is not rejected;
/// such a filter simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    must: Vec<FieldConstraint>,
    must_not: Vec<FieldConstraint>,
}

impl QueryFilter {
    /// Filter that matches every record
    pub fn match_all() -> Self {
        QueryFilter::default()
    }

    /// One `must` clause per included field and one `must_not` clause per excluded field
    pub fn from_selections(include: &CategorySelection, exclude: &CategorySelection) -> Self {
        QueryFilter {
            must: include.constraints().collect(),
            must_not: exclude.constraints().collect(),
        }
    }

    pub fn must(&self) -> &[FieldConstraint] {
        &self.must
    }

    pub fn must_not(&self) -> &[FieldConstraint] {
        &self.must_not
    }

    pub fn is_match_all(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    /// Whether a payload satisfies every `must` clause and no `must_not` clause
    ///
    /// A payload missing the field fails `must` and passes `must_not`.
    pub fn matches(&self, payload: &JobPayload) -> bool {
        self.must.iter().all(|c| c.holds_for(payload))
            && !self.must_not.iter().any(|c| c.holds_for(payload))
    }

    /// Keep the hits that match, in their original order
    pub fn apply(&self, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        if self.is_match_all() {
            return hits;
        }
        hits.into_iter()
            .filter(|hit| self.matches(hit.payload()))
            .collect()
    }
}

impl ValueObject for QueryFilter {}
