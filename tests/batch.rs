use std::fs;
use std::path::Path;

use chromseg::batch::{BatchOptions, STATUS_DIR, run_batch};
use chromseg::split::split_genome;
use chromseg::status::{Status, StatusStore};
use chromseg::{AnnotationTable, Error};

const ANNOTATION: &str = "##gff-version 3
chr1\tEDTA\tLTR_retrotransposon\t1\t4\t.\t+\t.\tID=te1
chr1\tEDTA\tLTR_retrotransposon\t5\t10\t.\t+\t.\tID=te2
chr1\tEDTA\thelitron\t8\t11\t.\t-\t.\tID=te3
chr10\tEDTA\tTIR\t2\t3\t.\t-\t.\tID=te4
chr1\tEDTA\tLTR_retrotransposon\t5\t10\t.\t+\t.\tID=te2_copy
chr1\tEDTA\tTIR\t-3\t4\t.\t+\t.\tID=te5
";

const GENOME: &str =
    ">chr1 chromosome 1\nACGTA\nCGTAC\n>chr10 chromosome 10\nTTGCA\n>scaffold_9\nNNNN\n";

/// Lay out one species the way the download step leaves it, then split its genome.
fn prepare_species(data: &Path, name: &str) {
    let root = data.join(name);
    fs::create_dir_all(&root).unwrap();
    let annotation = root.join(format!("{name}_TER_merged.gff3"));
    fs::write(&annotation, ANNOTATION).unwrap();
    let genome = root.join("genome.fna");
    fs::write(&genome, GENOME).unwrap();

    let keep = AnnotationTable::from_path(&annotation).unwrap().chromosomes();
    let summary = split_genome(&genome, Some(&keep), root.join("fasta")).unwrap();
    assert_eq!(summary.written.len(), 2);
    assert_eq!(summary.skipped, 1);
    fs::remove_file(genome).unwrap();
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn batch_segments_and_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path();
    prepare_species(data, "Arabidopsis_thaliana");
    prepare_species(data, "Oryza_sativa");

    let options = BatchOptions {
        threads: 2,
        ..Default::default()
    };
    let summary = run_batch(data, &options).unwrap();
    assert_eq!(summary.processed, vec!["Arabidopsis_thaliana", "Oryza_sativa"]);
    assert!(summary.failed.is_empty());
    // Per species: chr1_1_4, chr1_5_10 twice, chr10_2_3.
    assert_eq!(summary.stats.regions, 8);
    assert_eq!(summary.stats.out_of_range, 2);
    // The negative start is skipped without failing the species.
    assert_eq!(summary.stats.malformed, 2);

    let seq = data.join("Oryza_sativa/seq");
    assert_eq!(read(seq.join("chr1_1_4.fasta")), ">chr1_1_4\nACGT\n");
    assert_eq!(read(seq.join("chr1_5_10.fasta")), ">chr1_5_10\nACGTAC\n");
    assert_eq!(read(seq.join("chr10_2_3.fasta")), ">chr10_2_3\nTG\n");
    assert!(!seq.join("chr1_8_11.fasta").exists());
    assert_eq!(fs::read_dir(&seq).unwrap().count(), 3);

    let store = StatusStore::open(data.join(STATUS_DIR)).unwrap();
    assert_eq!(store.get("Oryza_sativa").unwrap(), Status::Done);

    // Second run finds everything done.
    let summary = run_batch(data, &options).unwrap();
    assert!(summary.processed.is_empty());
    assert_eq!(summary.skipped.len(), 2);
}

#[test]
fn failed_species_returns_to_pending() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path();
    prepare_species(data, "Zea_mays");
    fs::create_dir_all(data.join("Broken_species/fasta")).unwrap();

    let summary = run_batch(data, &BatchOptions::default()).unwrap();
    assert_eq!(summary.processed, vec!["Zea_mays"]);
    assert_eq!(summary.failed.len(), 1);
    let (name, err) = &summary.failed[0];
    assert_eq!(name, "Broken_species");
    assert!(matches!(err, Error::Io { .. }));

    let store = StatusStore::open(data.join(STATUS_DIR)).unwrap();
    assert_eq!(store.get("Broken_species").unwrap(), Status::Pending);
}

#[test]
fn stale_running_species_are_skipped_unless_reset() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path();
    prepare_species(data, "Zea_mays");
    let store = StatusStore::open(data.join(STATUS_DIR)).unwrap();
    store.set("Zea_mays", Status::Running).unwrap();

    let summary = run_batch(data, &BatchOptions::default()).unwrap();
    assert_eq!(summary.skipped, vec!["Zea_mays"]);

    let options = BatchOptions {
        reset_stale: true,
        ..Default::default()
    };
    let summary = run_batch(data, &options).unwrap();
    assert_eq!(summary.processed, vec!["Zea_mays"]);
    assert_eq!(store.get("Zea_mays").unwrap(), Status::Done);
}

#[test]
fn species_filter() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path();
    prepare_species(data, "Zea_mays");
    prepare_species(data, "Oryza_sativa");

    let options = BatchOptions {
        species: vec!["Zea_mays".to_string()],
        ..Default::default()
    };
    let summary = run_batch(data, &options).unwrap();
    assert_eq!(summary.processed, vec!["Zea_mays"]);
    assert!(!data.join("Oryza_sativa/seq").exists());
}
