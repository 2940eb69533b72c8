//! A `Hdf5Source` implemented directly over Rust structures rather than
//! real HDF5 binary bytes — lets the cross-linker, JSON decoders, and
//! lite loader be exercised end to end against literal spec scenarios
//! without a binary fixture-writer.

use async_trait::async_trait;
use bytes::Bytes;
use slp_core::{AttrValue, CompoundField, CompoundLayout, DatasetValue, Hdf5Item, Hdf5Source, ScalarType, Shape};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone)]
enum StoredValue {
    Group(HashMap<String, AttrValue>),
    Dataset(DatasetValue, u64),
}

#[derive(Default)]
pub struct FakeHdf5Source {
    nodes: Mutex<HashMap<String, StoredValue>>,
}

impl FakeHdf5Source {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata_group(mut self, attrs: HashMap<String, AttrValue>) -> Self {
        self.nodes.get_mut().unwrap().insert("metadata".into(), StoredValue::Group(attrs));
        self
    }

    pub fn with_compound(mut self, path: &str, layout: CompoundLayout, rows: Vec<u8>) -> Self {
        let row_count = (rows.len() / layout.row_size.max(1)) as u64;
        self.nodes.get_mut().unwrap().insert(
            path.to_string(),
            StoredValue::Dataset(DatasetValue::Compound { layout, rows: Bytes::from(rows) }, row_count),
        );
        self
    }

    pub fn with_json_rows(mut self, path: &str, rows: Vec<serde_json::Value>) -> Self {
        let count = rows.len() as u64;
        let blobs = rows.into_iter().map(|v| Bytes::from(v.to_string().into_bytes())).collect();
        self.nodes
            .get_mut()
            .unwrap()
            .insert(path.to_string(), StoredValue::Dataset(DatasetValue::VlenBytes(blobs), count));
        self
    }
}

#[async_trait]
impl Hdf5Source for FakeHdf5Source {
    async fn get(&self, path: &str) -> slp_core::Result<Option<Hdf5Item>> {
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes.get(path).map(|v| match v {
            StoredValue::Group(_) => Hdf5Item::Group(path.to_string()),
            StoredValue::Dataset(..) => Hdf5Item::Dataset(path.to_string()),
        }))
    }

    async fn attrs(&self, item: &Hdf5Item) -> slp_core::Result<HashMap<String, AttrValue>> {
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(item.path()) {
            Some(StoredValue::Group(attrs)) => Ok(attrs.clone()),
            _ => Ok(HashMap::new()),
        }
    }

    async fn shape(&self, item: &Hdf5Item) -> slp_core::Result<Option<Shape>> {
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(item.path()) {
            Some(StoredValue::Dataset(_, rows)) => Ok(Some(Shape(vec![*rows]))),
            _ => Ok(None),
        }
    }

    async fn value(&self, item: &Hdf5Item) -> slp_core::Result<DatasetValue> {
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(item.path()) {
            Some(StoredValue::Dataset(value, _)) => Ok(value.clone()),
            _ => Err(slp_core::Hdf5Error::NotFound(item.path().to_string())),
        }
    }

    async fn keys(&self) -> slp_core::Result<Vec<String>> {
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes.keys().cloned().collect())
    }

    async fn close(&self) -> slp_core::Result<()> {
        Ok(())
    }
}

/// Little-endian row builder for the fixed compound layouts the four SLP
/// tables use in these tests: every field is either `I64` or `F64`, laid
/// out at consecutive 8-byte offsets in declaration order.
pub struct RowBuilder {
    pub fields: Vec<(&'static str, ScalarType)>,
}

impl RowBuilder {
    pub fn new(fields: &[(&'static str, ScalarType)]) -> Self {
        Self { fields: fields.to_vec() }
    }

    pub fn layout(&self) -> CompoundLayout {
        let fields = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, (name, dtype))| CompoundField {
                name: name.to_string(),
                offset: i * 8,
                dtype: *dtype,
            })
            .collect();
        CompoundLayout { fields, row_size: self.fields.len() * 8 }
    }

    pub fn row(&self, values: &[f64]) -> Vec<u8> {
        assert_eq!(values.len(), self.fields.len());
        let mut out = Vec::with_capacity(self.fields.len() * 8);
        for (v, (_, dtype)) in values.iter().zip(&self.fields) {
            match dtype {
                ScalarType::I64 => out.extend_from_slice(&(*v as i64).to_le_bytes()),
                ScalarType::F64 => out.extend_from_slice(&v.to_le_bytes()),
                other => panic!("RowBuilder only supports I64/F64 in tests, got {other:?}"),
            }
        }
        out
    }
}
