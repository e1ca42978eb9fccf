use codeheap_core::model::{SegmentCategory, SegmentDeclaration};
use codeheap_core::services::parser::{
    classify_line, count_directives, parse_bounds, parse_entry, parse_hex, parse_report,
    BoundsColumns, Diagnostic, LineKind, ParseError, ParserOptions,
};

const SEGMENTED_LAYOUT: &str = include_str!("fixtures/segmented_codecache.txt");
const SEGMENTED_LIST: &str = include_str!("fixtures/segmented_codelist.txt");

#[test]
fn classifies_line_shapes() {
    assert_eq!(
        classify_line("CodeHeap 'non-profiled nmethods': size=120028Kb used=373Kb"),
        LineKind::SegmentHeader { label: "non-profiled nmethods" }
    );
    assert_eq!(
        classify_line("CodeCache: size=245760Kb used=4388Kb max_used=4388Kb free=241371Kb"),
        LineKind::SegmentHeader { label: "CodeCache" }
    );
    assert_eq!(
        classify_line("11 4 0 java.lang.Enum.ordinal()I [0x10, 0x20 - 0x30]"),
        LineKind::CompiledEntry
    );
    assert_eq!(classify_line(" bounds [0x1000, 0x2000, 0x3000]"), LineKind::Ignorable);
    assert_eq!(classify_line(" total_blobs=577 nmethods=213 adapters=265"), LineKind::Ignorable);
    assert_eq!(classify_line("12345:"), LineKind::Ignorable);
}

#[test]
fn hex_parsing_strips_prefix() {
    assert_eq!(parse_hex("0x00007f764cac9000"), Some(0x7f764cac9000));
    assert_eq!(parse_hex("ff"), Some(0xff));
    assert_eq!(parse_hex("0x"), None);
    assert_eq!(parse_hex("0xzz"), None);
}

#[test]
fn bounds_survive_hex_reserialization() {
    let line = " bounds [0x00007f764c000000, 0x00007f764cac9000, 0x00007f764cd39000]";
    let values = parse_bounds(line, 2).expect("bounds");
    let (start, end) = (values[1], values[2]);
    assert_eq!(format!("0x{start:016x}"), "0x00007f764cac9000");
    assert_eq!(format!("0x{end:016x}"), "0x00007f764cd39000");
}

#[test]
fn bounds_with_wrong_arity_are_rejected() {
    let err = parse_bounds(" bounds [0x1000, 0x2000]", 7).unwrap_err();
    assert!(matches!(err, ParseError::MalformedBounds { line: 7, .. }));
    let err = parse_bounds(" bounds 0x1000, 0x2000, 0x3000", 7).unwrap_err();
    assert!(matches!(err, ParseError::MalformedBounds { .. }));
}

#[test]
fn entry_fields_are_extracted() {
    let entry = parse_entry(
        "1 4 0 java.lang.Object.hashCode()I [0x2500, 0x2600 - 0x2700]",
        1,
        false,
    )
    .expect("entry");
    assert_eq!(entry.address, 0x2500);
    assert_eq!(entry.tier, 4);
    assert_eq!(entry.state, 0);
    assert_eq!(entry.name, "java.lang.Object.hashCode");
    assert_eq!(entry.invocation_count, None);
}

#[test]
fn entry_invocation_count_is_read_from_trailing_field() {
    let entry = parse_entry(
        "31 4 0 java.lang.String.startsWith(Ljava/lang/String;)Z [0x7f00, 0x7f10 - 0x7f20] 1532",
        3,
        true,
    )
    .expect("entry");
    assert_eq!(entry.name, "java.lang.String.startsWith");
    assert_eq!(entry.invocation_count, Some(1532));

    let err = parse_entry("31 4 0 java.lang.String.isEmpty()Z [0x7f00, 0x7f10 - 0x7f20]", 3, true)
        .unwrap_err();
    assert!(matches!(err, ParseError::MissingField { field: "invocation count", .. }));
}

#[test]
fn array_descriptors_are_not_taken_for_the_address_list() {
    let entry =
        parse_entry("13 4 0 java.lang.StringLatin1.hashCode([B)I [0x2500, 0x2600 - 0x2700]", 1, false)
            .expect("entry");
    assert_eq!(entry.name, "java.lang.StringLatin1.hashCode");
    assert_eq!(entry.address, 0x2500);

    let entry = parse_entry(
        "13 4 0 TestHotCodeHeap.main([Ljava/lang/String;)V 42 [0x7f764cac9610, 0x7f764cac97a0 - 0x7f764cac9870]",
        2,
        true,
    )
    .expect("entry");
    assert_eq!(entry.address, 0x7f764cac9610);
    assert_eq!(entry.invocation_count, Some(42));

    let entry = parse_entry(
        "14 4 0 java.util.Arrays.fill([II)V [0x3000, 0x3100 - 0x3200] 9",
        3,
        true,
    )
    .expect("entry");
    assert_eq!(entry.address, 0x3000);
    assert_eq!(entry.invocation_count, Some(9));
}

#[test]
fn invocation_count_is_read_after_the_qualified_name() {
    let entry = parse_entry(
        "31 4 0 java.lang.String.startsWith(Ljava/lang/String;)Z 1532 [0x7f00, 0x7f10 - 0x7f20]",
        1,
        true,
    )
    .expect("entry");
    assert_eq!(entry.name, "java.lang.String.startsWith");
    assert_eq!(entry.address, 0x7f00);
    assert_eq!(entry.invocation_count, Some(1532));

    let plain = parse_entry(
        "31 4 0 java.lang.String.startsWith(Ljava/lang/String;)Z 1532 [0x7f00, 0x7f10 - 0x7f20]",
        1,
        false,
    )
    .expect("entry");
    assert_eq!(plain.invocation_count, None);
}

#[test]
fn segmented_fixture_parses_every_entry() {
    let report = parse_report(SEGMENTED_LIST, &ParserOptions::default().unfiltered()).expect("parse");
    let main = report.entries.iter().find(|e| e.name == "TestHotCodeHeap.main").expect("main");
    assert_eq!(main.address, 0x7f764cac9610);
    let unsafe_get =
        report.entries.iter().find(|e| e.name == "jdk.internal.misc.Unsafe.getInt").expect("getInt");
    assert_eq!(unsafe_get.address, 0x7f764cac9910);
}

#[test]
fn malformed_entries_are_hard_errors() {
    let err = parse_entry("1 4 0 java.lang.Object.hashCode()I [0xnothex, 0x2600 - 0x2700]", 9, false)
        .unwrap_err();
    assert_eq!(err, ParseError::InvalidAddress { line: 9, value: "0xnothex".into() });

    let err = parse_entry("1 4 0 java.lang.Object.hashCode [0x2500, 0x2600 - 0x2700]", 9, false)
        .unwrap_err();
    assert!(matches!(err, ParseError::MissingField { field: "signature", .. }));

    let err = parse_entry("1 400 0 java.lang.Object.hashCode()I [0x2500, 0x2600 - 0x2700]", 9, false)
        .unwrap_err();
    assert!(matches!(err, ParseError::InvalidNumber { field: "tier", .. }));

    let report = parse_report(
        "CodeHeap 'extra-hot': size=10Kb\n bounds [0x1000, 0x2000, 0x3000]\n1 4 0 a.B.c()V [0x2500 0x2600]\n",
        &ParserOptions::default(),
    );
    assert!(matches!(report, Err(ParseError::MissingField { line: 3, field: "address", .. })));
}

#[test]
fn segmented_report_yields_declarations_in_order() {
    let report = parse_report(SEGMENTED_LAYOUT, &ParserOptions::default()).expect("parse");
    assert!(report.diagnostics.is_empty());
    assert_eq!(
        report.segments,
        vec![
            SegmentDeclaration::new(SegmentCategory::NonProfiled, 0x7f764cac9000, 0x7f764cd39000),
            SegmentDeclaration::new(SegmentCategory::Hot, 0x7f764d000000, 0x7f764d200000),
            SegmentDeclaration::new(SegmentCategory::Profiled, 0x7f7650000000, 0x7f7657530000),
            SegmentDeclaration::new(SegmentCategory::NonMethod, 0x7f7658000000, 0x7f7658590000),
        ]
    );
}

#[test]
fn low_boundary_columns_use_first_value_as_start() {
    let options = ParserOptions { bounds: BoundsColumns::LowToReserved, ..Default::default() };
    let report = parse_report(SEGMENTED_LAYOUT, &options).expect("parse");
    assert_eq!(report.segments[0].range.start, 0x7f764c000000);
    assert_eq!(report.segments[0].range.end, 0x7f764cd39000);
}

#[test]
fn default_filter_keeps_only_top_tier_entries() {
    let report = parse_report(SEGMENTED_LIST, &ParserOptions::default()).expect("parse");
    let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["java.lang.Enum.ordinal", "java.lang.Object.hashCode", "TestHotCodeHeap.main"]
    );

    let all = parse_report(SEGMENTED_LIST, &ParserOptions::default().unfiltered()).expect("parse");
    assert_eq!(all.entries.len(), 5);
    assert_eq!(all.entries[3].tier, 3);
}

#[test]
fn unknown_label_is_reported_and_parsing_continues() {
    let text = "CodeHeap 'method-handles': size=10Kb\n bounds [0x1000, 0x2000, 0x3000]\n\
                CodeHeap 'extra-hot': size=10Kb\n bounds [0x4000, 0x5000, 0x6000]\n";
    let report = parse_report(text, &ParserOptions::default()).expect("parse");
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::UnrecognizedSegmentLabel { line: 1, label: "method-handles".into() }]
    );
    assert_eq!(report.segments, vec![SegmentDeclaration::new(SegmentCategory::Hot, 0x5000, 0x6000)]);
    assert_eq!(report.diagnostics[0].to_string(), "line 1: unexpected segment 'method-handles'");
}

#[test]
fn header_without_bounds_line_fails() {
    let err = parse_report("CodeHeap 'extra-hot': size=10Kb", &ParserOptions::default())
        .unwrap_err();
    assert_eq!(err, ParseError::MissingBounds { line: 1, label: "extra-hot".into() });
}

#[test]
fn directive_lines_are_counted() {
    let text = "Directive: (default)\n matching: *.*\nDirective:\n matching: java/lang/String.equals\n";
    assert_eq!(count_directives(text), 2);
    assert_eq!(count_directives(""), 0);
}
