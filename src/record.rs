use std::fmt;
use std::ops::Index;
use std::slice::Iter;

/// One logical CSV row: an ordered, immutable sequence of string fields.
///
/// A record is a snapshot. Its field count and order are fixed at
/// construction and equality is structural, so two records compare equal
/// exactly when their field sequences do.
///
/// ```
/// use csvstream::Record;
///
/// let record: Record = ["a", "b", "c"].into_iter().collect();
/// assert_eq!(record.len(), 3);
/// assert_eq!(&record[1], "b");
/// assert_eq!(record, ["a", "b", "c"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    /// Creates a record from owned fields.
    pub fn new(fields: Vec<String>) -> Self {
        Record { fields }
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at position `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Iterator over the fields in order.
    pub fn iter(&self) -> Iter<'_, String> {
        self.fields.iter()
    }

    /// Consumes the record, returning the owned fields.
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    /// Borrowed view of the fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Index<usize> for Record {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.fields[index]
    }
}

impl From<Vec<String>> for Record {
    fn from(fields: Vec<String>) -> Self {
        Record { fields }
    }
}

impl FromIterator<String> for Record {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for Record {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().map(str::to_string).collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a String;
    type IntoIter = Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// Slice comparisons keep test assertions free of `to_string` noise.
impl<const N: usize> PartialEq<[&str; N]> for Record {
    fn eq(&self, other: &[&str; N]) -> bool {
        self.fields.len() == N && self.fields.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl PartialEq<&[&str]> for Record {
    fn eq(&self, other: &&[&str]) -> bool {
        self.fields.len() == other.len()
            && self.fields.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field:?}")?;
        }
        Ok(())
    }
}
