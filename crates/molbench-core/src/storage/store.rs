//! The molecule store public API.
//!
//! Ingestion deduplicates molecules by structural key: every distinct key
//! gets exactly one molecule row, and a conformer whose mapped structure
//! uses a different atom order than the stored molecule is permuted into the
//! stored order before it is written, so all conformers of one molecule are
//! directly comparable. Every query returns a fresh, independently owned
//! snapshot.

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, instrument};

use super::error::StoreError;
use super::schema;
use super::session::with_transaction;
use crate::core::chem::identity::StructuralKey;
use crate::core::chem::structure::Structure;
use crate::core::chem::toolkit::StructureToolkit;
use crate::core::models::collection::{QmResultCollection, QmResultEntry};
use crate::core::models::coordinates::Coordinates;
use crate::core::models::records::{
    MmConformerRecord, MoleculeRecord, NewRecord, QmConformerRecord,
};
use crate::core::units::{BOHR_TO_ANGSTROM, HARTREE_TO_KCAL_PER_MOL};

#[derive(Debug)]
pub struct MoleculeStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl MoleculeStore {
    /// Opens the store at `path`, creating and initializing it when absent.
    /// The extension must be `.sqlite`; an existing store must carry the
    /// current schema version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let extension_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("sqlite"));
        if !extension_ok {
            return Err(StoreError::UnsupportedFiletype {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        schema::check_version(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create-new ingestion of a QM result collection: refuses to touch an
    /// existing `path`, then deduplicates entries by structural key and
    /// writes one molecule row per distinct key and one QM conformer per
    /// entry, entries sorted by source id within each molecule. Ingesting a
    /// shuffled copy of the same collection yields an identical store.
    #[instrument(skip_all, name = "ingest_collection")]
    pub fn ingest_collection<T>(
        collection: &QmResultCollection,
        path: impl AsRef<Path>,
        toolkit: &T,
    ) -> Result<Self, StoreError>
    where
        T: StructureToolkit + ?Sized,
    {
        let path = path.as_ref();
        if path.exists() {
            return Err(StoreError::DatabaseExists {
                path: path.to_path_buf(),
            });
        }
        let store = Self::open(path)?;

        let mut groups: BTreeMap<StructuralKey, Vec<&QmResultEntry>> = BTreeMap::new();
        for entry in &collection.entries {
            let key = toolkit.key_for(&entry.mapped_structure)?;
            groups.entry(key).or_default().push(entry);
        }
        for group in groups.values_mut() {
            group.sort_by_key(|entry| entry.source_id);
        }
        info!(
            entries = collection.len(),
            molecules = groups.len(),
            "Ingesting QM result collection."
        );

        {
            let conn = store.lock_conn();
            with_transaction(&conn, |tx| {
                for (key, entries) in &groups {
                    let reference_mapped = entries[0].mapped_structure.as_str();
                    let reference_structure = toolkit.parse_mapped(reference_mapped)?;

                    tx.execute(
                        "INSERT INTO molecules (structural_key, mapped_structure) VALUES (?1, ?2)",
                        params![key.as_str(), reference_mapped],
                    )?;
                    let molecule_id = tx.last_insert_rowid();

                    for entry in entries {
                        let coordinates = entry_coordinates_in_reference_order(
                            entry,
                            reference_mapped,
                            &reference_structure,
                            toolkit,
                        )?;
                        tx.execute(
                            "INSERT INTO qm_conformers (molecule_id, source_id, coordinates, energy)
                             VALUES (?1, ?2, ?3, ?4)",
                            params![
                                molecule_id,
                                entry.source_id,
                                coordinates.to_blob(),
                                entry.final_energy * HARTREE_TO_KCAL_PER_MOL
                            ],
                        )?;
                    }
                }
                Ok(())
            })?;
        }
        Ok(store)
    }

    /// Appends QM or MM conformer records, reusing existing molecule rows for
    /// already-seen structural keys and creating rows only for unseen keys.
    /// The whole batch is one transaction: it commits fully or not at all.
    pub fn store<T>(&self, records: &[NewRecord], toolkit: &T) -> Result<(), StoreError>
    where
        T: StructureToolkit + ?Sized,
    {
        let conn = self.lock_conn();
        with_transaction(&conn, |tx| {
            for record in records {
                let (molecule_id, reference_mapped) = resolve_molecule(tx, record)?;
                match record {
                    NewRecord::Qm(qm) => {
                        let coordinates = aligned_coordinates(
                            &qm.coordinates,
                            &qm.mapped_structure,
                            &reference_mapped,
                            toolkit,
                        )?;
                        tx.execute(
                            "INSERT INTO qm_conformers (molecule_id, source_id, coordinates, energy)
                             VALUES (?1, ?2, ?3, ?4)",
                            params![molecule_id, qm.source_id, coordinates.to_blob(), qm.energy],
                        )?;
                    }
                    NewRecord::Mm(mm) => {
                        let coordinates = aligned_coordinates(
                            &mm.coordinates,
                            &mm.mapped_structure,
                            &reference_mapped,
                            toolkit,
                        )?;
                        tx.execute(
                            "INSERT INTO mm_conformers
                                 (molecule_id, source_id, force_field, coordinates, energy)
                             VALUES (?1, ?2, ?3, ?4, ?5)",
                            params![
                                molecule_id,
                                mm.source_id,
                                mm.force_field,
                                coordinates.to_blob(),
                                mm.energy
                            ],
                        )?;
                    }
                }
            }
            Ok(())
        })
    }

    pub fn molecule_count(&self) -> Result<usize, StoreError> {
        let conn = self.lock_conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM molecules", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Distinct mapped structural strings, one per molecule row.
    pub fn mapped_structures(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt =
            conn.prepare("SELECT DISTINCT mapped_structure FROM molecules ORDER BY mapped_structure")?;
        let strings = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(strings)
    }

    pub fn molecule_ids(&self) -> Result<Vec<i64>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare("SELECT id FROM molecules ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    pub fn molecules(&self) -> Result<Vec<MoleculeRecord>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt =
            conn.prepare("SELECT id, structural_key, mapped_structure FROM molecules ORDER BY id")?;
        let records = stmt
            .query_map([], |row| {
                Ok(MoleculeRecord {
                    id: row.get(0)?,
                    structural_key: StructuralKey::from_raw(row.get::<_, String>(1)?),
                    mapped_structure: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn molecule_id_by_source_id(&self, source_id: i64) -> Result<i64, StoreError> {
        let conn = self.lock_conn();
        conn.query_row(
            "SELECT molecule_id FROM qm_conformers WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StoreError::SourceNotFound { source_id })
    }

    /// Source ids of a molecule's QM conformers, ascending.
    pub fn source_ids_by_molecule_id(&self, molecule_id: i64) -> Result<Vec<i64>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT source_id FROM qm_conformers WHERE molecule_id = ?1 ORDER BY source_id",
        )?;
        let ids = stmt
            .query_map(params![molecule_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    pub fn qm_conformer_by_source_id(&self, source_id: i64) -> Result<Coordinates, StoreError> {
        let conn = self.lock_conn();
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT coordinates FROM qm_conformers WHERE source_id = ?1",
                params![source_id],
                |row| row.get(0),
            )
            .optional()?;
        let blob = blob.ok_or(StoreError::SourceNotFound { source_id })?;
        Ok(Coordinates::from_blob(&blob)?)
    }

    pub fn mm_conformer_by_source_id(
        &self,
        source_id: i64,
        force_field: &str,
    ) -> Result<Coordinates, StoreError> {
        let conn = self.lock_conn();
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT coordinates FROM mm_conformers
                 WHERE source_id = ?1 AND force_field = ?2",
                params![source_id, force_field],
                |row| row.get(0),
            )
            .optional()?;
        let blob = blob.ok_or(StoreError::SourceNotFound { source_id })?;
        Ok(Coordinates::from_blob(&blob)?)
    }

    pub fn qm_conformers_by_molecule_id(
        &self,
        molecule_id: i64,
    ) -> Result<Vec<Coordinates>, StoreError> {
        Ok(self
            .qm_conformer_records_by_molecule_id(molecule_id)?
            .into_iter()
            .map(|record| record.coordinates)
            .collect())
    }

    pub fn mm_conformers_by_molecule_id(
        &self,
        molecule_id: i64,
        force_field: &str,
    ) -> Result<Vec<Coordinates>, StoreError> {
        Ok(self
            .mm_conformer_records_by_molecule_id(molecule_id, force_field)?
            .into_iter()
            .map(|record| record.coordinates)
            .collect())
    }

    pub fn qm_conformer_records_by_molecule_id(
        &self,
        molecule_id: i64,
    ) -> Result<Vec<QmConformerRecord>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT molecule_id, source_id, coordinates, energy
             FROM qm_conformers WHERE molecule_id = ?1 ORDER BY source_id",
        )?;
        let rows = stmt
            .query_map(params![molecule_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(molecule_id, source_id, blob, energy)| {
                Ok(QmConformerRecord {
                    molecule_id,
                    source_id,
                    coordinates: Coordinates::from_blob(&blob)?,
                    energy,
                })
            })
            .collect()
    }

    pub fn mm_conformer_records_by_molecule_id(
        &self,
        molecule_id: i64,
        force_field: &str,
    ) -> Result<Vec<MmConformerRecord>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT molecule_id, source_id, force_field, coordinates, energy
             FROM mm_conformers WHERE molecule_id = ?1 AND force_field = ?2
             ORDER BY source_id",
        )?;
        let rows = stmt
            .query_map(params![molecule_id, force_field], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(molecule_id, source_id, force_field, blob, energy)| {
                Ok(MmConformerRecord {
                    molecule_id,
                    source_id,
                    force_field,
                    coordinates: Coordinates::from_blob(&blob)?,
                    energy,
                })
            })
            .collect()
    }

    pub fn qm_energies_by_molecule_id(&self, molecule_id: i64) -> Result<Vec<f64>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT energy FROM qm_conformers WHERE molecule_id = ?1 ORDER BY source_id",
        )?;
        let energies = stmt
            .query_map(params![molecule_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(energies)
    }

    pub fn mm_energies_by_molecule_id(
        &self,
        molecule_id: i64,
        force_field: &str,
    ) -> Result<Vec<f64>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT energy FROM mm_conformers
             WHERE molecule_id = ?1 AND force_field = ?2 ORDER BY source_id",
        )?;
        let energies = stmt
            .query_map(params![molecule_id, force_field], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(energies)
    }

    /// Force-field identifiers with at least one stored MM conformer.
    pub fn force_fields(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt =
            conn.prepare("SELECT DISTINCT force_field FROM mm_conformers ORDER BY force_field")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Source ids already minimized under `force_field`.
    pub fn mm_source_ids_by_force_field(
        &self,
        force_field: &str,
    ) -> Result<Vec<i64>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT source_id FROM mm_conformers WHERE force_field = ?1 ORDER BY source_id",
        )?;
        let ids = stmt
            .query_map(params![force_field], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    /// Replaces both provenance maps in one transaction.
    pub fn set_provenance(
        &self,
        general: &BTreeMap<String, String>,
        software: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let conn = self.lock_conn();
        with_transaction(&conn, |tx| {
            tx.execute("DELETE FROM general_provenance", [])?;
            tx.execute("DELETE FROM software_provenance", [])?;
            for (key, value) in general {
                tx.execute(
                    "INSERT INTO general_provenance (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
            }
            for (key, value) in software {
                tx.execute(
                    "INSERT INTO software_provenance (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
            }
            Ok(())
        })
    }

    pub fn general_provenance(&self) -> Result<BTreeMap<String, String>, StoreError> {
        self.provenance_map("general_provenance")
    }

    pub fn software_provenance(&self) -> Result<BTreeMap<String, String>, StoreError> {
        self.provenance_map("software_provenance")
    }

    fn provenance_map(&self, table: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!("SELECT key, value FROM {table}"))?;
        let map = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<String, String>>>()?;
        Ok(map)
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("molecule store mutex poisoned")
    }
}

/// Looks up the molecule row for a record's structural key, inserting a new
/// row (with the record's mapped structure) only for unseen keys. Returns
/// the row id and the stored mapped structure every conformer of this
/// molecule must be expressed in.
fn resolve_molecule(
    tx: &Transaction<'_>,
    record: &NewRecord,
) -> Result<(i64, String), StoreError> {
    let key = record.structural_key();
    let existing: Option<(i64, String)> = tx
        .query_row(
            "SELECT id, mapped_structure FROM molecules WHERE structural_key = ?1",
            params![key.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    if let Some(found) = existing {
        return Ok(found);
    }

    tx.execute(
        "INSERT INTO molecules (structural_key, mapped_structure) VALUES (?1, ?2)",
        params![key.as_str(), record.mapped_structure()],
    )?;
    Ok((tx.last_insert_rowid(), record.mapped_structure().to_string()))
}

/// Permutes `coordinates` (in `mapped`'s atom order) into the atom order of
/// `reference_mapped`, verifying the two describe the same molecule.
fn aligned_coordinates<T>(
    coordinates: &Coordinates,
    mapped: &str,
    reference_mapped: &str,
    toolkit: &T,
) -> Result<Coordinates, StoreError>
where
    T: StructureToolkit + ?Sized,
{
    if mapped == reference_mapped {
        return Ok(coordinates.clone());
    }
    let reference = toolkit.parse_mapped(reference_mapped)?;
    let other = toolkit.parse_mapped(mapped)?;
    let map = toolkit.atom_map(&reference, &other)?;
    Ok(coordinates.permuted(&map)?)
}

/// Converts one collection entry to stored units (Bohr → Å) in the molecule
/// row's atom order.
fn entry_coordinates_in_reference_order<T>(
    entry: &QmResultEntry,
    reference_mapped: &str,
    reference_structure: &Structure,
    toolkit: &T,
) -> Result<Coordinates, StoreError>
where
    T: StructureToolkit + ?Sized,
{
    let structure = toolkit.parse_mapped(&entry.mapped_structure)?;
    let bohr = Coordinates::from_flat(&entry.geometry, structure.atom_count())?;
    let angstrom = bohr.scaled(BOHR_TO_ANGSTROM);
    if entry.mapped_structure == reference_mapped {
        return Ok(angstrom);
    }
    let map = toolkit.atom_map(reference_structure, &structure)?;
    Ok(angstrom.permuted(&map)?)
}
