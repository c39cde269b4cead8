//! The record-store seam and its embedded sled implementation
use super::error::StoreError;
use super::lifecycle::UpdatePatch;
use super::material::{MaterialRequest, Plant, Vendor, format_material_id, parse_request_suffix};
use sled::Tree;
use std::sync::Arc;
use uuid7::uuid7;

/// What the engine needs from a record store: a full snapshot, creation with
/// store-assigned ids, and partial updates for status transitions. Nothing
/// here promises idempotency; callers re-fetch the full set after every
/// acknowledged write.
pub trait RecordStore {
    fn list(&self) -> Result<Vec<MaterialRequest>, StoreError>;
    /// Persist a new record. `material_id` and `request_id` are assigned by
    /// the store; values supplied on `record` are ignored.
    fn create(&self, record: MaterialRequest) -> Result<MaterialRequest, StoreError>;
    fn patch(&self, material_id: &str, patch: &UpdatePatch) -> Result<MaterialRequest, StoreError>;
    fn vendors(&self) -> Result<Vec<Vendor>, StoreError>;
    fn plants(&self) -> Result<Vec<Plant>, StoreError>;
}

const MATERIALS_TREE: &str = "materials";
const VENDORS_TREE: &str = "vendors";
const PLANTS_TREE: &str = "plants";
const ID_COUNTER_KEY: &[u8] = b"material_id_counter";

/// Sled-backed store. Records are CBOR values keyed by material id, so the
/// zero-padded ids keep the tree in creation order. Material ids come from
/// an atomic counter rather than a scan per creation, which keeps two
/// concurrent creators from ever minting the same id.
pub struct SledStore {
    db: Arc<sled::Db>,
    materials: Tree,
    vendors: Tree,
    plants: Tree,
}

impl SledStore {
    /// Open the trees and seed the id counter from the highest suffix
    /// already present, so a store inheriting records keeps numbering after
    /// them.
    pub fn open(db: Arc<sled::Db>) -> Result<Self, StoreError> {
        let store = Self {
            materials: db.open_tree(MATERIALS_TREE)?,
            vendors: db.open_tree(VENDORS_TREE)?,
            plants: db.open_tree(PLANTS_TREE)?,
            db,
        };
        store.seed_counter()?;
        Ok(store)
    }

    fn seed_counter(&self) -> Result<(), StoreError> {
        let mut max = 0u64;
        for entry in self.materials.iter() {
            let (_, value) = entry?;
            let record: MaterialRequest = minicbor::decode(value.as_ref())?;
            if let Some(suffix) = parse_request_suffix(&record.material_id) {
                max = max.max(suffix);
            }
        }

        self.db.update_and_fetch(ID_COUNTER_KEY, |current| {
            let current = current.map(counter_value).unwrap_or(0);
            Some(current.max(max).to_be_bytes().to_vec())
        })?;

        Ok(())
    }

    fn allocate_material_id(&self) -> Result<String, StoreError> {
        let next = self.db.update_and_fetch(ID_COUNTER_KEY, |current| {
            let current = current.map(counter_value).unwrap_or(0);
            Some((current + 1).to_be_bytes().to_vec())
        })?;

        let suffix = next.map(|v| counter_value(&v)).unwrap_or(1);
        Ok(format_material_id(suffix))
    }

    pub fn seed_vendors(&self, vendors: &[Vendor]) -> Result<(), StoreError> {
        for vendor in vendors {
            let bytes = minicbor::to_vec(vendor)?;
            self.vendors.insert(vendor.id.as_bytes(), bytes)?;
        }
        Ok(())
    }

    pub fn seed_plants(&self, plants: &[Plant]) -> Result<(), StoreError> {
        for plant in plants {
            let bytes = minicbor::to_vec(plant)?;
            self.plants.insert(plant.id.as_bytes(), bytes)?;
        }
        Ok(())
    }
}

fn counter_value(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    if bytes.len() == 8 {
        buf.copy_from_slice(bytes);
    }
    u64::from_be_bytes(buf)
}

impl RecordStore for SledStore {
    fn list(&self) -> Result<Vec<MaterialRequest>, StoreError> {
        let mut records = Vec::new();
        for entry in self.materials.iter() {
            let (_, value) = entry?;
            records.push(minicbor::decode(value.as_ref())?);
        }
        Ok(records)
    }

    fn create(&self, mut record: MaterialRequest) -> Result<MaterialRequest, StoreError> {
        record.material_id = self.allocate_material_id()?;
        record.request_id = uuid7().to_string();

        let bytes = minicbor::to_vec(&record)?;
        self.materials.insert(record.material_id.as_bytes(), bytes)?;

        tracing::debug!(material_id = %record.material_id, "record created");
        Ok(record)
    }

    fn patch(&self, material_id: &str, patch: &UpdatePatch) -> Result<MaterialRequest, StoreError> {
        let value = self
            .materials
            .get(material_id.as_bytes())?
            .ok_or_else(|| StoreError::NotFound(material_id.to_string()))?;

        let mut record: MaterialRequest = minicbor::decode(value.as_ref())?;
        record.status = patch.status;
        record.modified_at = patch.modified_at.clone();
        record.modified_by = patch.modified_by.clone();
        if let Some(number) = &patch.material_number {
            record.material_number = number.clone();
        }

        let bytes = minicbor::to_vec(&record)?;
        self.materials.insert(material_id.as_bytes(), bytes)?;

        tracing::debug!(material_id, status = %record.status, "record patched");
        Ok(record)
    }

    fn vendors(&self) -> Result<Vec<Vendor>, StoreError> {
        let mut vendors = Vec::new();
        for entry in self.vendors.iter() {
            let (_, value) = entry?;
            vendors.push(minicbor::decode(value.as_ref())?);
        }
        Ok(vendors)
    }

    fn plants(&self) -> Result<Vec<Plant>, StoreError> {
        let mut plants = Vec::new();
        for entry in self.plants.iter() {
            let (_, value) = entry?;
            plants.push(minicbor::decode(value.as_ref())?);
        }
        Ok(plants)
    }
}
