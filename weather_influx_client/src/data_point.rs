//! Points and their line protocol rendering

use chrono::{DateTime, Utc};
use std::{
    cmp,
    collections::BTreeMap,
    fmt::{self, Write as _},
    marker::PhantomData,
};

/// Incrementally constructs a [`DataPoint`].
///
/// Create this via [`DataPoint::builder`]. Line protocol has no way to
/// express a point without fields, so [`build`](DataPointBuilder::build)
/// only exists once at least one field was set.
#[derive(Debug)]
pub struct DataPointBuilder<F = NoFields> {
    measurement: EscapedMeasurement,
    // Keeping the tags sorted improves performance on the server side
    tags: BTreeMap<EscapedTagKey, EscapedTagValue>,
    fields: BTreeMap<EscapedFieldKey, FieldValue>,
    timestamp: Option<i64>,
    state: PhantomData<F>,
}

/// Typestate of a [`DataPointBuilder`] without fields
#[derive(Debug, Copy, Clone)]
pub struct NoFields;

/// Typestate of a [`DataPointBuilder`] holding at least one field
#[derive(Debug, Copy, Clone)]
pub struct WithFields;

impl DataPointBuilder<NoFields> {
    fn new(measurement: impl Into<EscapedMeasurement>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Default::default(),
            fields: Default::default(),
            timestamp: Default::default(),
            state: PhantomData,
        }
    }
}

impl<F> DataPointBuilder<F> {
    /// Sets a tag, replacing any existing tag of the same name.
    pub fn tag(
        mut self,
        name: impl Into<EscapedTagKey>,
        value: impl Into<EscapedTagValue>,
    ) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    /// Sets a field, replacing any existing field of the same name.
    pub fn field(
        self,
        name: impl Into<EscapedFieldKey>,
        value: impl Into<FieldValue>,
    ) -> DataPointBuilder<WithFields> {
        let Self {
            measurement,
            tags,
            mut fields,
            timestamp,
            state: _,
        } = self;
        fields.insert(name.into(), value.into());

        DataPointBuilder {
            measurement,
            tags,
            fields,
            timestamp,
            state: PhantomData,
        }
    }

    /// Sets the timestamp, replacing any existing timestamp.
    ///
    /// The value is treated as the number of whole seconds since the
    /// UNIX epoch, matching [`Precision::Second`](crate::Precision::Second).
    pub fn timestamp(mut self, value: i64) -> Self {
        self.timestamp = Some(value);
        self
    }
}

impl DataPointBuilder<WithFields> {
    /// Constructs the data point
    pub fn build(self) -> DataPoint {
        DataPoint {
            measurement: self.measurement,
            tags: self.tags,
            fields: self.fields,
            timestamp: self.timestamp,
        }
    }
}

/// A single point of information to send to InfluxDB.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    measurement: EscapedMeasurement,
    tags: BTreeMap<EscapedTagKey, EscapedTagValue>,
    fields: BTreeMap<EscapedFieldKey, FieldValue>,
    timestamp: Option<i64>,
}

impl DataPoint {
    /// Create a builder to incrementally construct a `DataPoint`.
    pub fn builder(measurement: impl Into<EscapedMeasurement>) -> DataPointBuilder {
        DataPointBuilder::new(measurement)
    }

    /// The unescaped measurement name
    pub fn measurement(&self) -> &str {
        self.measurement.as_str()
    }

    /// The unescaped value of the tag called `name`, if set
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .get(&EscapedTagKey::from(name))
            .map(Escaped::as_str)
    }

    /// All tags, ordered by key
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The value of the field called `name`, if set
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(&EscapedFieldKey::from(name))
    }

    /// All fields, ordered by key
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Seconds since the UNIX epoch, if a timestamp was set
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// The timestamp as a UTC date-time.
    ///
    /// `None` when no timestamp was set or when it lies outside the range
    /// `chrono` can represent.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Render this point as a single line of line protocol, without the
    /// trailing newline.
    pub fn line_protocol(&self) -> LineProtocol<'_> {
        LineProtocol(self)
    }
}

/// [`Display`](fmt::Display) adapter produced by [`DataPoint::line_protocol`]
#[derive(Debug, Clone, Copy)]
pub struct LineProtocol<'a>(&'a DataPoint);

impl fmt::Display for LineProtocol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.measurement)?;

        // the server rejects tags with an empty value
        for (k, v) in self.0.tags.iter().filter(|(_, v)| !v.0.is_empty()) {
            write!(f, ",{k}={v}")?;
        }

        for (i, (k, v)) in self.0.fields.iter().enumerate() {
            let d = if i == 0 { " " } else { "," };
            write!(f, "{d}{k}={v}")?;
        }

        if let Some(ts) = self.0.timestamp {
            write!(f, " {ts}")?;
        }

        Ok(())
    }
}

/// Render a batch of points as a line protocol request body, one point per line.
pub fn line_protocol_body<'a>(points: impl IntoIterator<Item = &'a DataPoint>) -> String {
    let mut body = String::new();
    for point in points {
        // writing to a String cannot fail
        let _ = writeln!(body, "{}", point.line_protocol());
    }
    body
}

/// A string that will be escaped according to the rules of measurements
pub type EscapedMeasurement = Escaped<Measurement>;
/// A string that will be escaped according to the rules of tag keys
pub type EscapedTagKey = Escaped<TagKey>;
/// A string that will be escaped according to the rules of tag values
pub type EscapedTagValue = Escaped<TagKey>;
/// A string that will be escaped according to the rules of field keys
pub type EscapedFieldKey = Escaped<TagKey>;

/// Ensures that a string value is appropriately escaped when it is sent to InfluxDB.
#[derive(Debug, Clone)]
pub struct Escaped<K>(String, PhantomData<K>);

impl<K> Escaped<K> {
    /// The raw, unescaped string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<K> PartialEq for Escaped<K> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<K> Eq for Escaped<K> {}

impl<K> PartialOrd for Escaped<K> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Escaped<K> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<K> From<&str> for Escaped<K>
where
    K: EscapingSpecification,
{
    fn from(other: &str) -> Self {
        Self(other.into(), PhantomData)
    }
}

impl<K> From<String> for Escaped<K>
where
    K: EscapingSpecification,
{
    fn from(other: String) -> Self {
        Self(other, PhantomData)
    }
}

impl<K> fmt::Display for Escaped<K>
where
    K: EscapingSpecification,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                // a raw line break would end the point
                '\n' => f.write_str(r"\n")?,
                '\r' => f.write_str(r"\r")?,
                '\t' => f.write_str(r"\t")?,
                '\u{c}' => f.write_str(r"\f")?,
                // a trailing backslash would escape the next delimiter
                '\\' => f.write_str(r"\\")?,
                c if K::DELIMITERS.contains(&c) => {
                    f.write_char('\\')?;
                    f.write_char(c)?;
                }
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// Specifies how to escape a particular piece of InfluxDB information.
///
/// Backslashes and control characters are escaped for every kind of string;
/// the delimiters differ.
pub trait EscapingSpecification {
    /// The delimiters that need to be escaped
    const DELIMITERS: &'static [char];
}

/// Rules to escape a measurement name
#[derive(Debug, Copy, Clone)]
pub struct Measurement(());

/// Rules to escape a tag key, tag value, or field key string
#[derive(Debug, Copy, Clone)]
pub struct TagKey(());

impl EscapingSpecification for Measurement {
    const DELIMITERS: &'static [char] = &[',', ' '];
}

impl EscapingSpecification for TagKey {
    const DELIMITERS: &'static [char] = &[',', '=', ' '];
}

/// Possible value types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// A 64-bit floating point number
    F64(f64),
    /// A 64-bit signed integer number
    I64(i64),
}

impl From<f64> for FieldValue {
    fn from(other: f64) -> Self {
        Self::F64(other)
    }
}

impl From<i64> for FieldValue {
    fn from(other: i64) -> Self {
        Self::I64(other)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F64(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}i"),
        }
    }
}
