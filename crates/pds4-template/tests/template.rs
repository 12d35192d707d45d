use pds4_template::{Document, Mutation, Occurrence, Template, TemplateError};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const LABEL: &str = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<Product_Observational>
  <Identification_Area>
    <logical_identifier>urn:nasa:pds:mission:data:placeholder</logical_identifier>
    <version_id>1.0</version_id>
  </Identification_Area>
  <File_Area_Observational>
    <File>
      <file_name>PLACEHOLDER</file_name>
      <records>0</records>
    </File>
    <Table_Binary>
      <records>0</records>
    </Table_Binary>
  </File_Area_Observational>
</Product_Observational>
";

fn mk_template() -> Template {
    Template::parse(LABEL)
}

#[test]
fn read_first_returns_value_between_delimiters() {
    let template = mk_template();
    assert_eq!(
        template.read("<file_name>", Occurrence::First).unwrap(),
        "PLACEHOLDER"
    );
    assert_eq!(
        template
            .read("<logical_identifier>", Occurrence::First)
            .unwrap(),
        "urn:nasa:pds:mission:data:placeholder"
    );
}

#[test]
fn read_missing_marker_is_not_found() {
    let template = mk_template();
    for occurrence in [Occurrence::First, Occurrence::Last] {
        let err = template.read("<md5_checksum>", occurrence).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref marker } if marker == "<md5_checksum>"));
    }
}

#[test]
fn read_last_and_all_follow_document_order() {
    let mut template = mk_template();
    template.replace_first("<records>", "7");

    assert_eq!(template.read("<records>", Occurrence::Last).unwrap(), "0");
    assert_eq!(template.read_all("<records>"), vec!["7", "0"]);
    assert!(template.read_all("<groups>").is_empty());
}

#[test]
fn replace_round_trips_and_leaves_other_lines() {
    let mut template = mk_template();
    let before: Vec<String> = template.document().lines().to_vec();

    let outcome = template.replace("<file_name>", "dsn_2023_101.tnf");
    assert_eq!(outcome, Mutation::Applied(1));
    assert_eq!(
        template.read("<file_name>", Occurrence::First).unwrap(),
        "dsn_2023_101.tnf"
    );

    let after = template.document().lines();
    assert_eq!(after.len(), before.len());
    for (idx, (old, new)) in before.iter().zip(after).enumerate() {
        if idx == 8 {
            assert_eq!(new, "      <file_name>dsn_2023_101.tnf</file_name>\n");
        } else {
            assert_eq!(old, new);
        }
    }
}

#[test]
fn replace_only_first_stops_after_first_match() {
    let mut template = Template::parse("<records>0</records>\n<other/>\n<records>0</records>\n");
    let outcome = template.replace_first("<records>", "42");

    assert_eq!(outcome, Mutation::Applied(1));
    assert_eq!(
        template.render(),
        "<records>42</records>\n<other/>\n<records>0</records>\n"
    );
}

#[test]
fn replace_all_rewrites_every_match() {
    let mut template = mk_template();
    assert_eq!(template.replace("<records>", "3"), Mutation::Applied(2));
    assert_eq!(template.read_all("<records>"), vec!["3", "3"]);
}

#[test]
fn replace_is_idempotent() {
    let mut once = mk_template();
    once.replace("<file_name>", "x.tnf");

    let mut twice = mk_template();
    twice.replace("<file_name>", "x.tnf");
    twice.replace("<file_name>", "x.tnf");

    assert_eq!(once.render(), twice.render());
}

#[test]
fn mutations_on_missing_marker_are_skipped() {
    let mut template = mk_template();
    assert_eq!(template.replace("<md5_checksum>", "abc"), Mutation::Skipped);
    assert_eq!(
        template.insert("<comment>", ["text"], Occurrence::First),
        Mutation::Skipped
    );
    assert_eq!(template.render(), LABEL);
}

#[test]
fn insert_after_last_shifts_following_lines() {
    let mut template = mk_template();
    let before = template.document().lines().to_vec();
    let anchor = template.document().positions("<records>").last().unwrap();

    let outcome = template.insert(
        "<records>",
        ["      <field>a</field>\n", "      <field>b</field>\n"],
        Occurrence::Last,
    );

    assert_eq!(outcome, Mutation::Applied(2));
    let after = template.document().lines();
    assert_eq!(after.len(), before.len() + 2);
    assert_eq!(after[anchor + 1], "      <field>a</field>\n");
    assert_eq!(after[anchor + 2], "      <field>b</field>\n");
    assert_eq!(&after[..=anchor], &before[..=anchor]);
    assert_eq!(&after[anchor + 3..], &before[anchor + 1..]);
}

#[test]
fn insert_first_uses_first_anchor() {
    let mut template = mk_template();
    template.insert("<records>", ["<x/>"], Occurrence::First);
    let lines = template.document().lines();
    assert_eq!(lines[9], "      <records>0</records>\n");
    assert_eq!(lines[10], "<x/>\n");
}

#[test]
fn insert_splits_multiline_text_into_physical_lines() {
    let mut template = Template::parse("<comment>\n</comment>\n");
    let outcome = template.insert("<comment>", ["first\nsecond"], Occurrence::First);

    assert_eq!(outcome, Mutation::Applied(2));
    assert_eq!(template.document().len(), 4);
    assert_eq!(template.render(), "<comment>\nfirst\nsecond\n</comment>\n");
}

#[test]
fn insert_before_places_block_ahead_of_closing_marker() {
    let mut template =
        Template::parse("<File>\n<Table_Binary>\n</Table_Binary>\n</File>\n");
    template.insert_before("</Table_Binary>", ["<Field/>\n"], Occurrence::Last);
    assert_eq!(
        template.render(),
        "<File>\n<Table_Binary>\n<Field/>\n</Table_Binary>\n</File>\n"
    );
}

#[test]
fn insert_uses_crlf_when_document_does() {
    let mut template = Template::parse("<a>\r\n</a>\r\n");
    template.insert("<a>", ["inner"], Occurrence::First);
    assert_eq!(template.render(), "<a>\r\ninner\r\n</a>\r\n");
}

#[test]
fn load_and_write_preserve_bytes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("template.xml");
    let output = dir.path().join("label.xml");
    let text = "<a>1</a>\r\n  <b>two</b>\n<c>3</c>";
    std::fs::write(&input, text).unwrap();

    let template = Template::load(&input).unwrap();
    assert_eq!(template.source(), Some(input.as_path()));
    template.write(&output).unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), text);
}

#[test]
fn load_missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.xml");
    let err = Document::load(&missing).unwrap_err();
    match err {
        TemplateError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}
