use std::fs;
use std::path::{Path, PathBuf};

use pds4_label_core::ExitCode;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const TEMPLATE: &str = "\
<Product_Observational>
  <Identification_Area>
    <logical_identifier>urn:nasa:pds:mro_rss:data_trk:placeholder</logical_identifier>
    <version_id>1.0</version_id>
  </Identification_Area>
  <Observation_Area>
    <comment>
    </comment>
    <Time_Coordinates>
      <start_date_time>X</start_date_time>
      <stop_date_time>X</stop_date_time>
    </Time_Coordinates>
  </Observation_Area>
  <File_Area_Observational>
    <File>
      <file_name>X</file_name>
      <md5_checksum>X</md5_checksum>
      <records>0</records>
    </File>
  </File_Area_Observational>
</Product_Observational>
";

const INFO: &str = r#"{
    "start_time": "2023-04-11T07:05:00Z",
    "end_time": "2023-04-11T23:59:55Z",
    "records": 105,
    "segments": {"2": 5, "5": 100},
    "downlink_dss_ids": ["25"],
    "downlink_bands": ["X"],
    "count_times": [10.0]
}"#;

fn cargo_bin() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("pds4-label").unwrap()
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let workspace = Workspace {
            dir: tempdir().unwrap(),
        };
        workspace.write("template.xml", TEMPLATE);
        workspace.write("info.json", INFO);
        workspace.write("trk.tnf", "abc");
        workspace
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn command(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin();
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Sub-templates that each carry a whole `<Table_Binary>` block.
    fn table_segments(&self) -> PathBuf {
        for (kind, length) in [(2u8, 20u64), (5, 8)] {
            self.write(
                &format!("segments/trk_TableBinary_SFDU_{kind:02}.xml"),
                &format!(
                    "    <Table_Binary>\n      <offset unit=\"byte\">0</offset>\n      <records>0</records>\n      <record_length unit=\"byte\">{length}</record_length>\n    </Table_Binary>\n"
                ),
            );
        }
        self.path("segments")
    }

    /// Sub-templates holding only the content placed inside the host's
    /// `<Table_Binary>` wrapper.
    fn record_segments(&self) -> PathBuf {
        for (kind, length) in [(2u8, 20u64), (5, 8)] {
            self.write(
                &format!("segments/trk_TableBinary_SFDU_{kind:02}.xml"),
                &format!(
                    "      <Record_Binary>\n        <name>SFDU {kind}</name>\n        <offset unit=\"byte\">0</offset>\n        <records>0</records>\n        <record_length unit=\"byte\">{length}</record_length>\n      </Record_Binary>\n"
                ),
            );
        }
        self.path("segments")
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn simple_writes_label_next_to_data() {
    let ws = Workspace::new();

    ws.command()
        .args(["simple", "trk.tnf", "-t", "template.xml", "-i", "info.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let label = read(&ws.path("trk.xml"));
    assert!(label.contains(
        "<logical_identifier>urn:nasa:pds:mro_rss:data_trk:trk</logical_identifier>"
    ));
    assert!(label.contains("<md5_checksum>900150983cd24fb0d6963f7d28e17f72</md5_checksum>"));
    assert!(label.contains("<records>105</records>"));
    assert_eq!(read(&ws.path("template.xml")), TEMPLATE);
}

#[test]
fn dry_run_prints_diff_and_writes_nothing() {
    let ws = Workspace::new();

    ws.command()
        .args([
            "--dry-run",
            "simple",
            "trk.tnf",
            "-t",
            "template.xml",
            "-i",
            "info.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("+      <records>105</records>"))
        .stdout(predicate::str::contains("-      <records>0</records>"));

    assert!(!ws.path("trk.xml").exists());
}

#[test]
fn simple_rename_moves_data_before_labelling() {
    let ws = Workspace::new();

    ws.command()
        .args([
            "simple",
            "trk.tnf",
            "-t",
            "template.xml",
            "-i",
            "info.json",
            "-r",
            "mromagr{start_year}_{start_doy}_{start_time}_{count_time}{dnlink_band}{dl_dss_id}.tnf",
        ])
        .assert()
        .success();

    assert!(!ws.path("trk.tnf").exists());
    assert!(ws.path("mromagr2023_101_0705_0010x25.tnf").exists());
    let label = read(&ws.path("mromagr2023_101_0705_0010x25.xml"));
    assert!(label.contains("<file_name>mromagr2023_101_0705_0010x25.tnf</file_name>"));
}

#[test]
fn unknown_rename_token_is_invalid_arguments() {
    let ws = Workspace::new();

    ws.command()
        .args([
            "simple", "trk.tnf", "-t", "template.xml", "-i", "info.json", "-r", "{bogus}.tnf",
        ])
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments as i32)
        .stderr(predicate::str::contains("bogus"));

    assert!(ws.path("trk.tnf").exists());
}

#[test]
fn eight_bit_samples_are_unsupported() {
    let ws = Workspace::new();
    ws.write(
        "info8.json",
        r#"{"start_time": "2023-04-11T00:00:00Z", "end_time": "2023-04-11T01:00:00Z", "records": 1, "sample_bits": 8}"#,
    );

    ws.command()
        .args(["simple", "trk.tnf", "-t", "template.xml", "-i", "info8.json"])
        .assert()
        .failure()
        .code(ExitCode::Unsupported as i32);

    assert!(!ws.path("trk.xml").exists());
}

#[test]
fn segmented_requires_segment_directory() {
    let ws = Workspace::new();

    ws.command()
        .args(["segmented", "trk.tnf", "-t", "template.xml", "-i", "info.json"])
        .assert()
        .failure()
        .code(ExitCode::Configuration as i32)
        .stderr(predicate::str::contains("segment directory"));
}

#[test]
fn segmented_places_records_inside_table_wrapper() {
    let ws = Workspace::new();
    let segments = ws.record_segments();
    ws.write(
        "segmented.xml",
        &TEMPLATE.replace(
            "    </File>\n",
            "    </File>\n    <Table_Binary>\n    </Table_Binary>\n",
        ),
    );

    ws.command()
        .args(["segmented", "trk.tnf", "-t", "segmented.xml", "-i", "info.json", "-c"])
        .arg(&segments)
        .assert()
        .success();

    let label = read(&ws.path("trk.xml"));
    assert_eq!(label.matches("<Table_Binary>").count(), 1);
    let file_close = label.find("</File>").unwrap();
    let open = label.find("<Table_Binary>").unwrap();
    let first = label.find("<name>SFDU 2</name>").unwrap();
    let second = label.find("<name>SFDU 5</name>").unwrap();
    let close = label.find("</Table_Binary>").unwrap();
    assert!(file_close < open);
    assert!(open < first && first < second && second < close);

    ws.command()
        .args(["get", "trk.xml", "<offset unit=\"byte\">", "--all"])
        .assert()
        .success()
        .stdout("0\n100\n");
}

#[test]
fn segment_directory_can_come_from_config_file() {
    let ws = Workspace::new();
    ws.table_segments();
    ws.write(
        ".pds4-label.toml",
        "[segments]\ndirectory = \"segments\"\nplacement = \"after\"\n",
    );

    ws.command()
        .args(["segmented", "trk.tnf", "-t", "template.xml", "-i", "info.json"])
        .assert()
        .success();

    let label = read(&ws.path("trk.xml"));
    let file_close = label.find("</File>").unwrap();
    let first_table = label.find("<Table_Binary>").unwrap();
    assert!(first_table > file_close);
}

#[test]
fn missing_sub_template_is_configuration_error() {
    let ws = Workspace::new();
    let segments = ws.record_segments();
    fs::remove_file(segments.join("trk_TableBinary_SFDU_05.xml")).unwrap();

    ws.command()
        .args(["segmented", "trk.tnf", "-t", "template.xml", "-i", "info.json", "-c"])
        .arg(&segments)
        .assert()
        .failure()
        .code(ExitCode::Configuration as i32)
        .stderr(predicate::str::contains("segment kind 5"));

    assert!(!ws.path("trk.xml").exists());
}

#[test]
fn invalid_config_file_is_configuration_error() {
    let ws = Workspace::new();
    ws.write("bad.toml", "[label]\nunknown = 1\n");

    ws.command()
        .args(["--config", "bad.toml", "get", "template.xml", "<version_id>"])
        .assert()
        .failure()
        .code(ExitCode::Configuration as i32);
}

#[test]
fn get_reads_first_last_and_all() {
    let ws = Workspace::new();

    ws.command()
        .args(["get", "template.xml", "<version_id>"])
        .assert()
        .success()
        .stdout("1.0\n");

    ws.command()
        .args(["get", "template.xml", "<start_date_time>", "--last"])
        .assert()
        .success()
        .stdout("X\n");
}

#[test]
fn get_missing_marker_is_not_found() {
    let ws = Workspace::new();

    ws.command()
        .args(["get", "template.xml", "<missing>"])
        .assert()
        .failure()
        .code(ExitCode::NotFound as i32)
        .stderr(predicate::str::contains("<missing>"));
}

#[test]
fn inventory_updates_csv_and_collection_label() {
    let ws = Workspace::new();
    ws.write("inventory.csv", "P,urn:x:old::1.0\r\n");
    ws.write(
        "inventory.xml",
        "<version_id>1.0</version_id>\n<Modification_History>\n<modification_date>2023-01-01</modification_date>\n<version_id>1.0</version_id>\n</Modification_History>\n<records>1</records>\n",
    );
    ws.write(
        "a.xml",
        "<logical_identifier>urn:x:a</logical_identifier>\n<version_id>1.0</version_id>\n",
    );

    ws.command()
        .args(["inventory", "-c", "inventory.csv", "-m", "new products", "-k", "a.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records at version 2.0"));

    assert_eq!(
        read(&ws.path("inventory.csv")),
        "P,urn:x:old::1.0\r\nP,urn:x:a::1.0\r\n"
    );
    assert!(read(&ws.path("inventory.xml")).contains("<description>new products</description>"));
}
