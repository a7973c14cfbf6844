// In: src/schema/builder.rs

//! Derives the stream schema of a payload.
//!
//! For a list of inputs the derivation runs three passes over the inputs in
//! order: identity (classname, label and attribute dictionaries), position
//! (timestamp, latitude/longitude, elevation) and values (one field per value
//! kind actually present). Field order, and therefore dictionary ids, follow
//! first appearance, so the same inputs always produce the same schema.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use arrow::datatypes::{Field, Schema, SchemaRef};
use indexmap::IndexMap;

use super::dictionary::DictionaryBuilder;
use super::field::FieldDescriptor;
use crate::bridge::format::{
    is_reserved, ConversionMode, ATTRIBUTES_KEY, BUCKET_COUNT_KEY, BUCKET_SPAN_KEY,
    CLASSNAME_DICT_ID, CLASSNAME_KEY, CONVERSION_MODE_KEY, FIRST_IDENTITY_DICT_ID,
    FORMAT_REVISION, FORMAT_REVISION_KEY, LABELS_KEY, LAST_BUCKET_KEY, NAME_KEY,
    TIME_UNITS_PER_SECOND_KEY,
};
use crate::config::{CodecConfig, EmptySeriesPolicy};
use crate::error::CodecError;
use crate::model::{ColumnMap, Encoder, Input, Metadata, Series, ValueKind};

/// An ordered field list plus the schema-level metadata of a stream.
#[derive(Debug, Clone)]
pub struct SeriesSchema {
    fields: Vec<FieldDescriptor>,
    metadata: HashMap<String, String>,
    mode: ConversionMode,
}

impl SeriesSchema {
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn to_arrow(&self) -> SchemaRef {
        let fields: Vec<Field> = self.fields.iter().map(FieldDescriptor::to_arrow).collect();
        Arc::new(Schema::new_with_metadata(fields, self.metadata.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityKind {
    Label,
    Attribute,
}

pub struct SchemaBuilder<'a> {
    config: &'a CodecConfig,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(config: &'a CodecConfig) -> Self {
        Self { config }
    }

    /// Schema of a heterogeneous list of series and encoders (LIST mode).
    pub fn for_inputs(&self, inputs: &[Input]) -> Result<SeriesSchema, CodecError> {
        if inputs.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        if self.config.empty_series == EmptySeriesPolicy::Reject {
            if let Some(empty) = inputs.iter().find(|input| input.is_empty()) {
                return Err(CodecError::EmptySeries(empty.display_name().to_string()));
            }
        }

        let mut fields = identity_fields(inputs)?;

        if inputs.iter().any(|input| !input.is_empty()) {
            fields.push(FieldDescriptor::timestamp());
        }
        // A non-empty encoder may hold any position and any value kind.
        let has_encoder = inputs
            .iter()
            .any(|input| matches!(input, Input::Encoder(e) if !e.is_empty()));
        let has_location =
            has_encoder || inputs.iter().any(|i| i.points().any(|p| p.location.is_some()));
        let has_elevation =
            has_encoder || inputs.iter().any(|i| i.points().any(|p| p.elevation.is_some()));
        push_positional(&mut fields, has_location, has_elevation);

        let mut kinds = BTreeSet::new();
        if has_encoder {
            kinds.extend(ValueKind::ALL);
        }
        for input in inputs {
            if let Input::Series(series) = input {
                kinds.extend(series.series_type().value_kind());
                kinds.extend(series.points().iter().map(|p| p.value.kind()));
            }
        }
        fields.extend(kinds.into_iter().map(FieldDescriptor::value));

        let metadata = self.base_metadata(ConversionMode::List);
        log::debug!(
            "Derived list schema: {} fields for {} inputs",
            fields.len(),
            inputs.len()
        );
        Ok(SeriesSchema {
            fields,
            metadata,
            mode: ConversionMode::List,
        })
    }

    /// Schema of a single series (SERIES mode). Identity and bucketization
    /// travel in the schema metadata.
    pub fn for_series(&self, series: &Series) -> Result<SeriesSchema, CodecError> {
        self.check_not_empty(series.is_empty(), series.name())?;

        let mut fields = vec![FieldDescriptor::timestamp()];
        push_positional(&mut fields, series.has_locations(), series.has_elevations());
        match series.series_type().value_kind() {
            Some(kind) => fields.push(FieldDescriptor::value(kind)),
            None if !series.is_empty() => {
                return Err(CodecError::UndefinedType(series.name().to_string()))
            }
            None => {}
        }

        let mut metadata = self.base_metadata(ConversionMode::Series);
        write_identity(series.metadata(), &mut metadata)?;
        if let Some(buckets) = series.bucketization() {
            metadata.insert(BUCKET_SPAN_KEY.to_string(), buckets.span.to_string());
            metadata.insert(BUCKET_COUNT_KEY.to_string(), buckets.count.to_string());
            metadata.insert(LAST_BUCKET_KEY.to_string(), buckets.last_bucket.to_string());
        }

        Ok(SeriesSchema {
            fields,
            metadata,
            mode: ConversionMode::Series,
        })
    }

    /// Schema of a single encoder (ENCODER mode). A non-empty encoder gets
    /// every positional field and all five value fields.
    pub fn for_encoder(&self, encoder: &Encoder) -> Result<SeriesSchema, CodecError> {
        self.check_not_empty(encoder.is_empty(), encoder.name().unwrap_or_default())?;

        let mut fields = vec![FieldDescriptor::timestamp()];
        if !encoder.is_empty() {
            push_positional(&mut fields, true, true);
            fields.extend(ValueKind::ALL.into_iter().map(FieldDescriptor::value));
        }

        let mut metadata = self.base_metadata(ConversionMode::Encoder);
        if let Some(identity) = encoder.metadata() {
            write_identity(identity, &mut metadata)?;
        }

        Ok(SeriesSchema {
            fields,
            metadata,
            mode: ConversionMode::Encoder,
        })
    }

    /// Schema of a column map (PAIR mode). Caller metadata is kept, but the
    /// format keys always win.
    pub fn for_columns(
        &self,
        user_metadata: &HashMap<String, String>,
        columns: &ColumnMap,
    ) -> Result<SeriesSchema, CodecError> {
        let fields = columns
            .iter()
            .map(|(name, column)| FieldDescriptor::column(name, column.data_type()))
            .collect();
        let mut metadata = user_metadata.clone();
        metadata.extend(self.base_metadata(ConversionMode::Pair));
        Ok(SeriesSchema {
            fields,
            metadata,
            mode: ConversionMode::Pair,
        })
    }

    fn check_not_empty(&self, is_empty: bool, name: &str) -> Result<(), CodecError> {
        if is_empty && self.config.empty_series == EmptySeriesPolicy::Reject {
            return Err(CodecError::EmptySeries(name.to_string()));
        }
        Ok(())
    }

    fn base_metadata(&self, mode: ConversionMode) -> HashMap<String, String> {
        HashMap::from([
            (FORMAT_REVISION_KEY.to_string(), FORMAT_REVISION.to_string()),
            (
                TIME_UNITS_PER_SECOND_KEY.to_string(),
                self.config.time_units_per_second.to_string(),
            ),
            (CONVERSION_MODE_KEY.to_string(), mode.as_tag().to_string()),
        ])
    }
}

//==================================================================================
// Identity pass
//==================================================================================

fn identity_fields(inputs: &[Input]) -> Result<Vec<FieldDescriptor>, CodecError> {
    let mut classnames = DictionaryBuilder::new(CLASSNAME_DICT_ID);
    let mut keys: IndexMap<&str, IdentityKind> = IndexMap::new();

    for identity in inputs.iter().filter_map(Input::identity) {
        if !identity.name.is_empty() {
            classnames.insert(&identity.name);
        }
        for key in identity.labels.keys() {
            keys.entry(key.as_str()).or_insert(IdentityKind::Label);
        }
        for key in identity.attributes.keys() {
            keys.entry(key.as_str()).or_insert(IdentityKind::Attribute);
        }
    }

    let mut fields = Vec::with_capacity(keys.len() + 1);
    if !classnames.is_empty() {
        fields.push(FieldDescriptor::classname(classnames.finish(CLASSNAME_KEY)?));
    }

    for ((key, kind), dict_id) in keys.into_iter().zip(FIRST_IDENTITY_DICT_ID..) {
        if is_reserved(key) {
            return Err(CodecError::ReservedName(key.to_string()));
        }
        // Label and attribute values of the same key share one table.
        let mut values = DictionaryBuilder::new(dict_id);
        for identity in inputs.iter().filter_map(Input::identity) {
            if let Some(v) = identity.labels.get(key) {
                values.insert(v);
            }
            if let Some(v) = identity.attributes.get(key) {
                values.insert(v);
            }
        }
        let dictionary = values.finish(key)?;
        fields.push(match kind {
            IdentityKind::Label => FieldDescriptor::label(key, dictionary)?,
            IdentityKind::Attribute => FieldDescriptor::attribute(key, dictionary)?,
        });
    }

    Ok(fields)
}

fn push_positional(fields: &mut Vec<FieldDescriptor>, has_location: bool, has_elevation: bool) {
    if has_location {
        fields.push(FieldDescriptor::latitude());
        fields.push(FieldDescriptor::longitude());
    }
    if has_elevation {
        fields.push(FieldDescriptor::elevation());
    }
}

/// Writes name, labels and attributes into single-series metadata.
fn write_identity(
    identity: &Metadata,
    metadata: &mut HashMap<String, String>,
) -> Result<(), CodecError> {
    if let Some(key) = identity
        .labels
        .keys()
        .chain(identity.attributes.keys())
        .find(|k| is_reserved(k))
    {
        return Err(CodecError::ReservedName(key.clone()));
    }
    metadata.insert(NAME_KEY.to_string(), identity.name.clone());
    if !identity.labels.is_empty() {
        metadata.insert(LABELS_KEY.to_string(), serde_json::to_string(&identity.labels)?);
    }
    if !identity.attributes.is_empty() {
        metadata.insert(ATTRIBUTES_KEY.to_string(), serde_json::to_string(&identity.attributes)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Encoder, Value};
    use crate::schema::field::FieldRole;

    fn names(schema: &SeriesSchema) -> Vec<&str> {
        schema.fields().iter().map(|f| f.name()).collect()
    }

    #[test]
    fn test_list_schema_field_order() {
        // --- ARRANGE ---
        let mut a = Series::with_metadata(Metadata::new("temp").with_label("city", "paris"));
        a.push(10, Some(7), None, Value::Double(1.5)).unwrap();
        let mut b = Encoder::with_metadata(
            Metadata::new("hum").with_label("city", "lyon").with_attribute("unit", "pct"),
        );
        b.push(20, None, Some(100), Value::Long(3));
        let inputs = vec![Input::Series(a), Input::Encoder(b)];
        let config = CodecConfig::default();

        // --- ACT ---
        let schema = SchemaBuilder::new(&config).for_inputs(&inputs).unwrap();

        // --- ASSERT ---
        assert_eq!(
            names(&schema),
            vec![
                "classname", "city", "unit", "timestamp", "latitude", "longitude", "elevation",
                "LONG", "DOUBLE", "BOOLEAN", "STRING", "BYTES",
            ]
        );
        let city = schema.field("city").unwrap().dictionary().unwrap();
        assert_eq!(city.id(), 1);
        assert_eq!(city.code("paris"), Some(0));
        assert_eq!(city.code("lyon"), Some(1));
        assert!(matches!(schema.field("unit").unwrap().role(), FieldRole::Attribute(_)));
        assert_eq!(schema.mode(), ConversionMode::List);
    }

    #[test]
    fn test_key_used_as_label_and_attribute_unions_values() {
        let a = Series::with_metadata(Metadata::new("a").with_label("site", "s1"));
        let b = Series::with_metadata(Metadata::new("b").with_attribute("site", "s2"));
        let config = CodecConfig::default();

        let schema = SchemaBuilder::new(&config)
            .for_inputs(&[Input::Series(a), Input::Series(b)])
            .unwrap();

        let site = schema.field("site").unwrap();
        assert!(matches!(site.role(), FieldRole::Label(_)));
        assert_eq!(site.dictionary().unwrap().len(), 2);
    }

    #[test]
    fn test_reserved_label_is_rejected() {
        let series = Series::with_metadata(Metadata::new("x").with_label("timestamp", "now"));
        let config = CodecConfig::default();

        let result = SchemaBuilder::new(&config).for_inputs(&[Input::Series(series)]);
        assert!(matches!(result, Err(CodecError::ReservedName(ref k)) if k == "timestamp"));
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let config = CodecConfig::default();
        let result = SchemaBuilder::new(&config).for_inputs(&[]);
        assert!(matches!(result, Err(CodecError::EmptyInput)));
    }

    #[test]
    fn test_reject_policy_refuses_empty_series() {
        let config = CodecConfig {
            empty_series: EmptySeriesPolicy::Reject,
            ..Default::default()
        };
        let builder = SchemaBuilder::new(&config);
        assert!(matches!(
            builder.for_series(&Series::new("void")),
            Err(CodecError::EmptySeries(_))
        ));
        assert!(matches!(
            builder.for_inputs(&[Input::Series(Series::new("void"))]),
            Err(CodecError::EmptySeries(_))
        ));
    }

    #[test]
    fn test_anonymous_inputs_have_no_classname() {
        let mut encoder = Encoder::new();
        encoder.push(1, None, None, Value::Boolean(true));
        let config = CodecConfig::default();

        let schema = SchemaBuilder::new(&config)
            .for_inputs(&[Input::Encoder(encoder)])
            .unwrap();
        assert_eq!(names(&schema), ENCODER_FIELDS.to_vec());
    }

    const ENCODER_FIELDS: [&str; 9] = [
        "timestamp", "latitude", "longitude", "elevation", "LONG", "DOUBLE", "BOOLEAN", "STRING",
        "BYTES",
    ];

    #[test]
    fn test_encoder_gets_every_position_and_value_field() {
        let mut encoder = Encoder::with_metadata(Metadata::new("ticker"));
        encoder.push(0, None, None, Value::Long(7));
        let config = CodecConfig::default();
        let builder = SchemaBuilder::new(&config);

        let single = builder.for_encoder(&encoder).unwrap();
        assert_eq!(names(&single), ENCODER_FIELDS.to_vec());

        let list = builder.for_inputs(&[Input::Encoder(encoder)]).unwrap();
        let mut expected = vec!["classname"];
        expected.extend(ENCODER_FIELDS);
        assert_eq!(names(&list), expected);
    }

    #[test]
    fn test_series_inputs_only_get_the_fields_they_use() {
        let mut a = Series::new("a");
        a.push(1, None, None, Value::Double(0.5)).unwrap();
        let mut b = Series::new("b");
        b.push(2, None, Some(30), Value::Long(4)).unwrap();
        let empty_encoder = Encoder::with_metadata(Metadata::new("quiet"));
        let config = CodecConfig::default();

        let schema = SchemaBuilder::new(&config)
            .for_inputs(&[Input::Series(a), Input::Series(b), Input::Encoder(empty_encoder)])
            .unwrap();
        assert_eq!(names(&schema), vec!["classname", "timestamp", "elevation", "LONG", "DOUBLE"]);
    }

    #[test]
    fn test_all_empty_inputs_have_no_timestamp() {
        let a = Series::with_metadata(Metadata::new("a").with_label("zone", "z1"));
        let b = Encoder::with_metadata(Metadata::new("b"));
        let config = CodecConfig::default();

        let schema = SchemaBuilder::new(&config)
            .for_inputs(&[Input::Series(a), Input::Encoder(b)])
            .unwrap();
        assert_eq!(names(&schema), vec!["classname", "zone"]);
    }

    #[test]
    fn test_single_series_metadata() {
        let mut series = Series::with_metadata(Metadata::new("temp").with_label("room", "a1"));
        series.push(0, None, None, Value::String("warm".into())).unwrap();
        let config = CodecConfig::default();

        let schema = SchemaBuilder::new(&config).for_series(&series).unwrap();

        assert_eq!(names(&schema), vec!["timestamp", "STRING"]);
        assert_eq!(schema.metadata()[NAME_KEY], "temp");
        assert_eq!(schema.metadata()[LABELS_KEY], r#"{"room":"a1"}"#);
        assert!(!schema.metadata().contains_key(ATTRIBUTES_KEY));
        assert_eq!(schema.metadata()[CONVERSION_MODE_KEY], "SERIES");
    }

    #[test]
    fn test_pair_format_keys_override_user_metadata() {
        let user = HashMap::from([
            ("source".to_string(), "sensor-7".to_string()),
            (CONVERSION_MODE_KEY.to_string(), "LIST".to_string()),
        ]);
        let config = CodecConfig::default();

        let schema = SchemaBuilder::new(&config)
            .for_columns(&user, &ColumnMap::new())
            .unwrap();
        assert_eq!(schema.metadata()["source"], "sensor-7");
        assert_eq!(schema.metadata()[CONVERSION_MODE_KEY], "PAIR");
    }
}
