use common::{FilterField, SongFields};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter {0:?} is not of the form field:pattern")]
    MissingSeparator(String),
    #[error("invalid pattern in filter {filter:?}: {source}")]
    Pattern {
        filter: String,
        #[source]
        source: regex::Error,
    },
}

/// One `field:pattern` test. The pattern is searched case-insensitively.
#[derive(Clone, Debug)]
pub struct FilterPredicate {
    name: String,
    field: Option<FilterField>,
    pattern: Regex,
}

impl FilterPredicate {
    pub fn parse(text: &str) -> Result<Self, FilterError> {
        let (name, pattern) = text
            .split_once(':')
            .ok_or_else(|| FilterError::MissingSeparator(text.to_string()))?;
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| FilterError::Pattern {
                filter: text.to_string(),
                source,
            })?;
        let field = FilterField::parse(name);
        if field.is_none() {
            warn!("Filter field {:?} is not recognised and will never match", name);
        }
        Ok(Self {
            name: name.to_string(),
            field,
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches<S: SongFields + ?Sized>(&self, song: &S) -> bool {
        let field = match self.field {
            Some(field) => field,
            None => return false,
        };
        match song.field(field.name_in(song.schema())) {
            Some(value) => self.pattern.is_match(&value),
            None => false,
        }
    }
}

/// Predicates joined with either "any" or "all".
#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    predicates: Vec<FilterPredicate>,
    match_all: bool,
}

impl FilterSet {
    pub fn new(predicates: Vec<FilterPredicate>, match_all: bool) -> Self {
        Self {
            predicates,
            match_all,
        }
    }

    pub fn parse<I, T>(filters: I, match_all: bool) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let predicates = filters
            .into_iter()
            .map(|text| FilterPredicate::parse(text.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(predicates, match_all))
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches<S: SongFields + ?Sized>(&self, song: &S) -> bool {
        if self.predicates.is_empty() {
            return true;
        }
        if self.match_all {
            self.predicates.iter().all(|predicate| predicate.matches(song))
        } else {
            self.predicates.iter().any(|predicate| predicate.matches(song))
        }
    }

    pub fn partition<S: SongFields>(&self, songs: Vec<S>) -> (Vec<S>, Vec<S>) {
        songs.into_iter().partition(|song| self.matches(song))
    }
}

/// Include and exclude sets applied together.
#[derive(Clone, Debug, Default)]
pub struct SongFilter {
    pub include: FilterSet,
    pub exclude: FilterSet,
}

impl SongFilter {
    pub fn new(include: FilterSet, exclude: FilterSet) -> Self {
        Self { include, exclude }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn matches<S: SongFields + ?Sized>(&self, song: &S) -> bool {
        if !self.include.matches(song) {
            return false;
        }
        self.exclude.is_empty() || !self.exclude.matches(song)
    }

    pub fn partition<S: SongFields>(&self, songs: Vec<S>) -> (Vec<S>, Vec<S>) {
        songs.into_iter().partition(|song| self.matches(song))
    }
}
