use crate::common::error::{ManifestDecode, Result, U8VectorToString};
use kube::core::DynamicObject;
use serde::Deserialize;
use serde_yaml::Value;
use snafu::ResultExt;
use std::str;

/// Decodes a release's rendered manifest, which is represented as
/// multi-document YAML, into individual resource objects. Empty documents are
/// skipped; a chart which rendered no resources decodes to an empty list.
pub fn decode_resource_yaml(manifest: &[u8]) -> Result<Vec<DynamicObject>> {
    let text = str::from_utf8(manifest).context(U8VectorToString)?;

    let mut resources: Vec<DynamicObject> = Vec::new();
    for (document_index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = Value::deserialize(document).context(ManifestDecode { document_index })?;
        if value.is_null() {
            continue;
        }
        let resource: DynamicObject =
            serde_yaml::from_value(value).context(ManifestDecode { document_index })?;
        resources.push(resource);
    }
    Ok(resources)
}
