// In: src/schema/field.rs

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field};

use super::dictionary::Dictionary;
use crate::bridge::format::{
    is_reserved, ATTRIBUTE_ROLE, CLASSNAME_KEY, ELEVATION_KEY, IDENTITY_ROLE_KEY, LABEL_ROLE,
    LATITUDE_KEY, LONGITUDE_KEY, TIMESTAMP_KEY,
};
use crate::error::CodecError;
use crate::model::ValueKind;

/// What a field carries, which decides how rows are projected onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    Classname,
    Label(String),
    Attribute(String),
    Timestamp,
    Latitude,
    Longitude,
    Elevation,
    Value(ValueKind),
    /// A caller-named column of a column map.
    Column,
}

/// A schema field plus the dictionary it encodes against, if any.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    role: FieldRole,
    data_type: DataType,
    dictionary: Option<Arc<Dictionary>>,
}

impl FieldDescriptor {
    pub fn classname(dictionary: Dictionary) -> Self {
        Self::dictionary_field(CLASSNAME_KEY.to_string(), FieldRole::Classname, dictionary)
    }

    pub fn label(key: &str, dictionary: Dictionary) -> Result<Self, CodecError> {
        check_identity_key(key)?;
        Ok(Self::dictionary_field(key.to_string(), FieldRole::Label(key.to_string()), dictionary))
    }

    pub fn attribute(key: &str, dictionary: Dictionary) -> Result<Self, CodecError> {
        check_identity_key(key)?;
        Ok(Self::dictionary_field(
            key.to_string(),
            FieldRole::Attribute(key.to_string()),
            dictionary,
        ))
    }

    fn dictionary_field(name: String, role: FieldRole, dictionary: Dictionary) -> Self {
        Self {
            name,
            role,
            data_type: dictionary.width().dictionary_type(),
            dictionary: Some(Arc::new(dictionary)),
        }
    }

    pub fn timestamp() -> Self {
        Self::plain(TIMESTAMP_KEY, FieldRole::Timestamp, DataType::Int64)
    }

    pub fn latitude() -> Self {
        Self::plain(LATITUDE_KEY, FieldRole::Latitude, DataType::Float32)
    }

    pub fn longitude() -> Self {
        Self::plain(LONGITUDE_KEY, FieldRole::Longitude, DataType::Float32)
    }

    pub fn elevation() -> Self {
        Self::plain(ELEVATION_KEY, FieldRole::Elevation, DataType::Int64)
    }

    pub fn value(kind: ValueKind) -> Self {
        Self::plain(kind.field_name(), FieldRole::Value(kind), kind.data_type())
    }

    pub fn column(name: &str, data_type: DataType) -> Self {
        Self::plain(name, FieldRole::Column, data_type)
    }

    fn plain(name: &str, role: FieldRole, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            role,
            data_type,
            dictionary: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &FieldRole {
        &self.role
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn dictionary(&self) -> Option<&Arc<Dictionary>> {
        self.dictionary.as_ref()
    }

    /// The Arrow field. Every field is nullable; label and attribute fields
    /// record their role in the field metadata.
    pub fn to_arrow(&self) -> Field {
        match &self.dictionary {
            Some(dictionary) => {
                let field = Field::new_dict(
                    self.name.clone(),
                    self.data_type.clone(),
                    true,
                    dictionary.id(),
                    false,
                );
                let role = match self.role {
                    FieldRole::Label(_) => Some(LABEL_ROLE),
                    FieldRole::Attribute(_) => Some(ATTRIBUTE_ROLE),
                    _ => None,
                };
                match role {
                    Some(role) => field.with_metadata(HashMap::from([(
                        IDENTITY_ROLE_KEY.to_string(),
                        role.to_string(),
                    )])),
                    None => field,
                }
            }
            None => Field::new(self.name.clone(), self.data_type.clone(), true),
        }
    }
}

fn check_identity_key(key: &str) -> Result<(), CodecError> {
    if is_reserved(key) {
        return Err(CodecError::ReservedName(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::dictionary::DictionaryBuilder;

    #[test]
    fn test_reserved_label_key_is_rejected() {
        let dict = DictionaryBuilder::new(1).finish("LONG").unwrap();
        let result = FieldDescriptor::label("LONG", dict);
        assert!(matches!(result, Err(CodecError::ReservedName(ref k)) if k == "LONG"));
    }

    #[test]
    fn test_label_field_carries_dictionary_and_role() {
        let mut builder = DictionaryBuilder::new(4);
        builder.insert("eu-west");
        let field = FieldDescriptor::label("region", builder.finish("region").unwrap()).unwrap();

        let arrow_field = field.to_arrow();
        assert_eq!(arrow_field.dict_id(), Some(4));
        assert!(arrow_field.is_nullable());
        assert_eq!(
            arrow_field.metadata().get(IDENTITY_ROLE_KEY).map(String::as_str),
            Some(LABEL_ROLE)
        );
        assert!(matches!(arrow_field.data_type(), DataType::Dictionary(k, v)
            if **k == DataType::Int8 && **v == DataType::Utf8));
    }
}
