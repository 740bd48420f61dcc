//! Parquet-backed sources driven through a full run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, Int32Array, ListArray};
use arrow::datatypes::{Field, Float32Type, Float64Type, Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use lh_analysis::{Observable, Run};
use lh_core::{EventSource, PION_MASS};
use lh_hist::Axis;
use lh_io::{PairSource, SourceConfig, TrackTableSource};

fn tmp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lh_io_{name}_{}", std::process::id()));
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    let fields: Vec<Field> =
        columns.iter().map(|(name, a)| Field::new(*name, a.data_type().clone(), true)).collect();
    let arrays = columns.into_iter().map(|(_, a)| a).collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = parquet::arrow::ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Back-to-back pion pairs with momentum `p` along x, one per index.
fn pair_columns(prefix: &str, index: &[i32], p: &[f64]) -> Vec<(String, ArrayRef)> {
    let zeros = vec![0.0; p.len()];
    let minus: Vec<f64> = p.iter().map(|v| -v).collect();
    vec![
        (format!("{prefix}_i"), Arc::new(Int32Array::from(index.to_vec())) as ArrayRef),
        (format!("{prefix}_pxp"), Arc::new(Float64Array::from(p.to_vec())) as ArrayRef),
        (format!("{prefix}_pyp"), Arc::new(Float64Array::from(zeros.clone())) as ArrayRef),
        (format!("{prefix}_pzp"), Arc::new(Float64Array::from(zeros.clone())) as ArrayRef),
        (format!("{prefix}_pxm"), Arc::new(Float64Array::from(minus)) as ArrayRef),
        (format!("{prefix}_pym"), Arc::new(Float64Array::from(zeros.clone())) as ArrayRef),
        (format!("{prefix}_pzm"), Arc::new(Float64Array::from(zeros)) as ArrayRef),
    ]
}

fn write_pairs(path: &Path, prefix: &str, index: &[i32], p: &[f64]) {
    let columns = pair_columns(prefix, index, p);
    write_parquet(path, columns.iter().map(|(n, a)| (n.as_str(), a.clone())).collect());
}

/// Invariant mass of a back-to-back pion pair with momentum `p` each.
fn pair_mass(p: f64) -> f64 {
    2.0 * (PION_MASS * PION_MASS + p * p).sqrt()
}

#[test]
fn pair_tables_fill_migration() {
    let dir = tmp_dir("pairs");
    let (gen_path, rec_path) = (dir.join("gen.parquet"), dir.join("rec.parquet"));
    write_pairs(&gen_path, "gen", &[0, 1, 2, 3], &[0.3, 0.4, 0.5, 0.6]);
    write_pairs(&rec_path, "rec", &[1, 3], &[0.41, 0.59]);

    let mut source = PairSource::from_parquet(&gen_path, &rec_path, PION_MASS).unwrap();
    let mut run = Run::new();
    let axis = Axis::new(0.0, 1.5, 75).unwrap();
    run.register_fill("mass", axis, Observable::PairMass).unwrap();
    let result = run.execute(&mut source).unwrap();

    assert_eq!(result.events_seen(), 4);
    assert_eq!(result.events_without_reconstruction(), 2);
    let h = result.get("mass").unwrap();
    assert_eq!(h.before_cuts().total(), 4.0);
    // unmatched generated rows are still selected, on their generated view
    assert_eq!(h.after_cuts().total(), 4.0);
    assert_eq!(h.missing_reconstruction(), 2);
    let gen_bin = axis.bin_index(pair_mass(0.4)).bin().unwrap();
    let rec_bin = axis.bin_index(pair_mass(0.41)).bin().unwrap();
    assert_eq!(h.migration().bin_count(gen_bin, rec_bin), 1.0);
    assert_eq!(h.migration().in_range_total(), 2.0);
}

#[test]
fn empty_reconstructed_table_keeps_its_columns() {
    let dir = tmp_dir("empty_rec");
    let (gen_path, rec_path) = (dir.join("gen.parquet"), dir.join("rec.parquet"));
    write_pairs(&gen_path, "gen", &[0, 1], &[0.3, 0.4]);
    write_pairs(&rec_path, "rec", &[], &[]);

    let mut source = PairSource::from_parquet(&gen_path, &rec_path, PION_MASS).unwrap();
    assert_eq!(source.len(), 2);
    let mut run = Run::new();
    run.register_fill("mass", Axis::new(0.0, 1.5, 75).unwrap(), Observable::PairMass).unwrap();
    let result = run.execute(&mut source).unwrap();

    assert_eq!(result.events_seen(), 2);
    assert_eq!(result.events_without_reconstruction(), 2);
    let h = result.get("mass").unwrap();
    assert_eq!(h.migration().total(), 0.0);
    assert_eq!(h.after_cuts().total(), 2.0);
}

#[test]
fn track_table_with_castor_from_parquet() {
    let dir = tmp_dir("tracks");
    let path = dir.join("tracks.parquet");
    let list = |rows: Vec<Vec<f64>>| -> ArrayRef {
        Arc::new(ListArray::from_iter_primitive::<Float64Type, _, _>(
            rows.into_iter().map(|r| Some(r.into_iter().map(Some).collect::<Vec<_>>())),
        ))
    };
    let int_list = |rows: Vec<Vec<i32>>| -> ArrayRef {
        Arc::new(ListArray::from_iter_primitive::<Int32Type, _, _>(
            rows.into_iter().map(|r| Some(r.into_iter().map(Some).collect::<Vec<_>>())),
        ))
    };
    write_parquet(
        &path,
        vec![
            ("event", Arc::new(Int32Array::from(vec![10, 11])) as ArrayRef),
            ("p", list(vec![vec![0.5, 0.5], vec![1.0]])),
            ("phi", list(vec![vec![0.0, std::f64::consts::PI], vec![0.0]])),
            ("lambda", list(vec![vec![0.0, 0.0], vec![0.0]])),
            ("qoverp", list(vec![vec![2.0, -2.0], vec![1.0]])),
            ("chi2", list(vec![vec![1.0, 1.0], vec![1.0]])),
            ("ndof", int_list(vec![vec![1, 1], vec![1]])),
            ("x", list(vec![vec![0.0, 0.0], vec![0.0]])),
            ("y", list(vec![vec![0.0, 0.0], vec![0.0]])),
            ("z", list(vec![vec![0.0, 0.0], vec![0.0]])),
            ("castor_module", int_list(vec![vec![1], vec![]])),
            ("castor_sector", int_list(vec![vec![4], vec![]])),
            (
                "castor_energy",
                Arc::new(ListArray::from_iter_primitive::<Float32Type, _, _>(
                    vec![Some(vec![Some(3.5f32)]), Some(vec![])],
                )) as ArrayRef,
            ),
            ("run_label", Arc::new(Float32Array::from(vec![1.0, 1.0])) as ArrayRef),
        ],
    );

    let mut source = TrackTableSource::from_parquet(&path).unwrap();
    assert_eq!(source.len(), 2);
    source.advance().unwrap();
    let e = source.generated();
    assert_eq!(e.id, 10);
    assert_eq!(e.tracks.len(), 2);
    assert_eq!(e.tracks[1].charge, -1);
    assert_eq!(e.tracks[0].ndof, 1);
    assert_eq!(e.castor.len(), 1);
    assert_eq!(e.castor[0].sector, 4);
    assert_eq!(e.castor_energy(), 3.5);

    let mut run = Run::new();
    run.register_fill("n", Axis::new(0.0, 5.0, 5).unwrap(), Observable::TrackCount).unwrap();
    run.register_cut("two tracks", true, |e: &lh_core::Event| e.tracks.len() == 2).unwrap();
    let result = run.execute(&mut source).unwrap();
    let h = result.get("n").unwrap();
    assert_eq!(h.before_cuts().counts(), &[0.0, 1.0, 1.0, 0.0, 0.0]);
    assert_eq!(h.after_cuts().counts(), &[0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn source_config_opens_relative_paths() {
    let dir = tmp_dir("config");
    write_pairs(&dir.join("g.parquet"), "gen", &[0, 1], &[0.3, 0.4]);
    write_pairs(&dir.join("r.parquet"), "rec", &[0, 1], &[0.3, 0.4]);
    std::fs::write(
        dir.join("events.out"),
        "EVENT: 1 2 1\nVERTEX: 0 0 0 0 1 0 0 2\n\
         TRACK: 9 0.3 0 0 1 1 0 211\nTRACK: 9 -0.3 0 0 1 1 0 -211\n",
    )
    .unwrap();

    let yaml = "kind: pair_parquet\ngenerated: g.parquet\nreconstructed: r.parquet\n";
    let cfg: SourceConfig = serde_yaml_ng::from_str(yaml).unwrap();
    let mut source = cfg.open(&dir).unwrap();
    let mut seen = 0;
    while source.has_more().unwrap() {
        source.advance().unwrap();
        assert!(source.reconstructed().is_some());
        seen += 1;
    }
    assert_eq!(seen, 2);

    let cfg: SourceConfig = serde_yaml_ng::from_str("kind: starlight\npath: events.out\n").unwrap();
    let mut source = cfg.open(&dir).unwrap();
    let mut run = Run::new();
    run.register_fill("mass", Axis::new(0.0, 1.5, 75).unwrap(), Observable::PairMass).unwrap();
    let result = run.execute(&mut source).unwrap();
    assert_eq!(result.get("mass").unwrap().after_cuts().total(), 1.0);
    assert!(source.name().ends_with("events.out"));
}
