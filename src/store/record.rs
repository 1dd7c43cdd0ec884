use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::collections::HashSet;
use std::sync::Mutex;

/// Identifier of a stored photo.
///
/// Stored as a JSON number, but older data and some call paths carry it as a
/// string, so both forms are accepted and compared by their decimal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(pub i64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhotoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(PhotoId)
    }
}

impl Serialize for PhotoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for PhotoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Float(f64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Ok(PhotoId(n)),
            RawId::Float(f) if f.fract() == 0.0 => Ok(PhotoId(f as i64)),
            RawId::Float(f) => Err(serde::de::Error::custom(format!("non-integer photo id {}", f))),
            RawId::Text(s) => s
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("non-numeric photo id '{}'", s))),
        }
    }
}

/// Gallery category tag.
///
/// Unknown tags survive a load/save cycle unchanged but never match a
/// specific category filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Personal,
    Travel,
    Nature,
    Events,
    Family,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 5] = [
        Category::Personal,
        Category::Travel,
        Category::Nature,
        Category::Events,
        Category::Family,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Personal => "personal",
            Category::Travel => "travel",
            Category::Nature => "nature",
            Category::Events => "events",
            Category::Family => "family",
            Category::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s {
            "personal" => Category::Personal,
            "travel" => Category::Travel,
            "nature" => Category::Nature,
            "events" => Category::Events,
            "family" => Category::Family,
            other => Category::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Category::from(s.as_str()))
    }
}

/// Which rendered items a category selection shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(s: &str) -> Self {
        match s {
            "all" => CategoryFilter::All,
            other => CategoryFilter::Only(Category::from(other)),
        }
    }

    pub fn matches(&self, category: &Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => category.is_known() && wanted == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => write!(f, "{}", c),
        }
    }
}

/// One stored gallery entry. Never modified once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    /// Self-contained `data:` URL of the image
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub date: DateTime<Utc>,
}

impl PhotoRecord {
    /// Build the record for a freshly uploaded file.
    pub fn from_upload(
        id: PhotoId,
        file_name: &str,
        url: String,
        category: Category,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            url,
            title: title_from_filename(file_name).to_string(),
            description: upload_caption(now),
            category,
            date: now,
        }
    }
}

/// Strip the final extension from a file name.
///
/// Only a non-empty trailing `.ext` without path separators is removed, so
/// `archive.tar.gz` keeps `archive.tar` and `README` is unchanged.
pub fn title_from_filename(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => {
            let ext = &name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                name
            } else {
                &name[..dot]
            }
        }
        None => name,
    }
}

/// Default description for an uploaded photo, dated in local time.
pub fn upload_caption(now: DateTime<Utc>) -> String {
    format!("Uploaded on {}", now.with_timezone(&Local).format("%-m/%-d/%Y"))
}

/// Hands out photo ids: creation time in milliseconds plus the file's offset
/// in its batch, bumped past the last id issued so batches started in the
/// same millisecond never collide.
///
/// Once nothing is left above the newest id, the first free id at or after
/// the preferred one is used instead, wrapping around through negative ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    state: Mutex<IdState>,
}

#[derive(Debug, Default)]
struct IdState {
    last: Option<i64>,
    taken: HashSet<i64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue after ids already in use. None of them is issued again.
    pub fn resuming(in_use: impl IntoIterator<Item = PhotoId>) -> Self {
        let taken: HashSet<i64> = in_use.into_iter().map(|id| id.0).collect();
        let last = taken.iter().max().copied();
        Self {
            state: Mutex::new(IdState { last, taken }),
        }
    }

    /// `None` only once every `i64` has been handed out.
    pub fn next_id(&self, now: DateTime<Utc>, batch_offset: usize) -> Option<PhotoId> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let preferred = now.timestamp_millis().saturating_add(batch_offset as i64);

        let increasing = match state.last {
            None => Some(preferred),
            Some(last) => last.checked_add(1).map(|next| next.max(preferred)),
        };
        let id = match increasing {
            Some(id) => id,
            None => {
                let free = (preferred..=i64::MAX)
                    .chain(i64::MIN..preferred)
                    .find(|id| !state.taken.contains(id))?;
                tracing::warn!(id = free, "No ids left above the newest photo; using a free one");
                free
            }
        };

        state.taken.insert(id);
        state.last = Some(state.last.map_or(id, |last| last.max(id)));
        Some(PhotoId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("sunset.jpg"), "sunset");
        assert_eq!(title_from_filename("archive.tar.gz"), "archive.tar");
        assert_eq!(title_from_filename("README"), "README");
        assert_eq!(title_from_filename("trailing."), "trailing.");
        assert_eq!(title_from_filename(".hidden"), "");
    }

    #[test]
    fn test_photo_id_accepts_number_or_string() {
        let a: PhotoId = serde_json::from_str("1700000000123").unwrap();
        let b: PhotoId = serde_json::from_str("\"1700000000123\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1700000000123");
        assert!(serde_json::from_str::<PhotoId>("\"abc\"").is_err());
        assert_eq!(serde_json::to_string(&a).unwrap(), "1700000000123");
    }

    #[test]
    fn test_category_round_trip_keeps_unknown() {
        let c: Category = serde_json::from_str("\"travel\"").unwrap();
        assert_eq!(c, Category::Travel);

        let other: Category = serde_json::from_str("\"wedding\"").unwrap();
        assert_eq!(other, Category::Other("wedding".to_string()));
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"wedding\"");
    }

    #[test]
    fn test_filter_matching() {
        let unknown = Category::Other("wedding".to_string());

        assert!(CategoryFilter::All.matches(&Category::Travel));
        assert!(CategoryFilter::All.matches(&unknown));

        let travel = CategoryFilter::parse("travel");
        assert!(travel.matches(&Category::Travel));
        assert!(!travel.matches(&Category::Personal));
        assert!(!travel.matches(&unknown));

        // An unknown tag does not even match a filter naming it
        assert!(!CategoryFilter::parse("wedding").matches(&unknown));
    }

    #[test]
    fn test_record_from_upload() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let record = PhotoRecord::from_upload(
            PhotoId(1),
            "sunset.jpg",
            "data:image/jpeg;base64,AAAA".to_string(),
            Category::default(),
            now,
        );

        assert_eq!(record.title, "sunset");
        assert_eq!(record.category, Category::Personal);
        assert!(record.description.starts_with("Uploaded on "));
        assert_eq!(record.date, now);
    }

    #[test]
    fn test_id_allocator_is_strictly_increasing() {
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let ids = IdAllocator::new();

        assert_eq!(ids.next_id(now, 0), Some(PhotoId(1_000)));
        assert_eq!(ids.next_id(now, 1), Some(PhotoId(1_001)));
        // A second batch in the same millisecond moves past the first
        assert_eq!(ids.next_id(now, 0), Some(PhotoId(1_002)));

        let resumed = IdAllocator::resuming([PhotoId(5_000), PhotoId(3)]);
        assert_eq!(resumed.next_id(now, 0), Some(PhotoId(5_001)));
    }

    #[test]
    fn test_id_allocator_survives_the_largest_id() {
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let ids = IdAllocator::resuming([PhotoId(i64::MAX), PhotoId(1_000), PhotoId(1_001)]);

        let issued: Vec<PhotoId> = (0..3).map(|_| ids.next_id(now, 0).unwrap()).collect();
        assert_eq!(issued, vec![PhotoId(1_002), PhotoId(1_003), PhotoId(1_004)]);

        // Later files in the batch prefer a higher id and take it when free
        assert_eq!(ids.next_id(now, 10), Some(PhotoId(1_010)));
        assert_eq!(ids.next_id(now, 0), Some(PhotoId(1_005)));
    }
}
