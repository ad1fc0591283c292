use crate::cli::IngestArgs;
use crate::error::Result;
use molbench::core::chem::toolkit::GraphToolkit;
use molbench::core::models::collection::QmResultCollection;
use molbench::storage::store::MoleculeStore;
use tracing::info;

pub fn run(args: IngestArgs) -> Result<()> {
    info!("Loading QM result collection from {:?}", &args.collection);
    let collection = QmResultCollection::from_file(&args.collection)?;

    println!(
        "Ingesting {} QM conformer(s) into {:?}...",
        collection.len(),
        &args.store
    );
    let store = MoleculeStore::ingest_collection(&collection, &args.store, &GraphToolkit)?;

    println!(
        "Stored {} distinct molecule(s) at {:?}.",
        store.molecule_count()?,
        store.path()
    );
    Ok(())
}
