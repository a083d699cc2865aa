//! End-to-end conversion tests.
//!
//! Every dialect is converted from a fixture file through the registry,
//! the same way the CLI does it.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use legaljson::types::Signature;
use legaljson::xml::schema::cached_validator;
use legaljson::{
    create_parser, detect, Conclusion, LegalJsonValidator, ParseOptions, Parsed, ParserError,
    Step,
};

/// Path of a fixture file.
fn fixture(dialect: &str, name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(dialect)
        .join(name)
}

/// Load fixture file content.
fn load_fixture(dialect: &str, name: &str) -> String {
    let path = fixture(dialect, name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// Detect, create and run the parser for a fixture.
fn convert(dialect: &str, name: &str) -> Parsed {
    let path = fixture(dialect, name);
    let parser = create_parser(None, &path)
        .unwrap_or_else(|e| panic!("No parser for {}: {}", path.display(), e));
    parser
        .parse(&path)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

fn ids<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    items.into_iter().collect()
}

#[test]
fn test_routing_by_root() {
    let cases = [
        ("formex", "directive.xml", "formex"),
        ("akn", "regulation.xml", "akn"),
        ("akn", "akn4eu.xml", "akn4eu"),
        ("akn", "german.xml", "german"),
        ("akn", "luxembourg.xml", "luxembourg"),
        ("boe", "ley.xml", "boe"),
        ("cellar", "regulation.html", "cellar"),
        ("cellar-standard", "decision.html", "cellar-standard"),
        ("proposal", "com.html", "proposal"),
        ("regional", "legge.html", "regional"),
    ];
    for (dialect, name, expected) in cases {
        assert_eq!(detect(&fixture(dialect, name)).unwrap(), expected, "{dialect}/{name}");
    }
}

#[test]
fn test_parsing_is_deterministic() {
    for (dialect, name) in [
        ("formex", "directive.xml"),
        ("akn", "regulation.xml"),
        ("cellar-standard", "decision.html"),
        ("proposal", "com.html"),
    ] {
        let first = convert(dialect, name).document.to_json().unwrap();
        let second = convert(dialect, name).document.to_json().unwrap();
        assert_eq!(first, second, "{dialect}/{name}");
    }
}

#[test]
fn test_formex_directive() {
    let parsed = convert("formex", "directive.xml");
    assert!(parsed.is_complete(), "{:?}", parsed.failures);
    let doc = &parsed.document;

    assert_eq!(
        doc.preface.as_deref(),
        Some("DIRECTIVE (EU) 2024/1500 OF THE EUROPEAN PARLIAMENT AND OF THE COUNCIL of 14 May 2024 on standards for equality bodies")
    );
    assert_eq!(
        doc.formula.as_deref(),
        Some("THE EUROPEAN PARLIAMENT AND THE COUNCIL OF THE EUROPEAN UNION,")
    );

    assert_eq!(doc.citations.len(), 2);
    assert_eq!(doc.citations[0].e_id, "cit_1");
    assert_eq!(
        doc.citations[1].text,
        "Having regard to the opinion of the European Economic and Social Committee,"
    );

    assert_eq!(doc.recitals.len(), 4);
    assert_eq!(doc.recitals[3].e_id, "rct_4");
    assert_eq!(
        doc.recitals[3].text,
        "Minimum standards should therefore be laid down."
    );
    assert_eq!(doc.preamble_final.as_deref(), Some("HAVE ADOPTED THIS DIRECTIVE:"));

    assert_eq!(doc.chapters.len(), 1);
    assert_eq!(doc.chapters[0].num.as_deref(), Some("CHAPTER I"));
    assert_eq!(doc.chapters[0].heading.as_deref(), Some("General provisions"));

    assert_eq!(ids(doc.articles.iter().map(|a| a.e_id.as_str())), vec!["art_001", "art_002"]);
    assert_eq!(doc.articles[1].heading.as_deref(), Some("Independence"));
    assert_eq!(
        ids(doc.articles[1].children.iter().map(|c| c.text.as_str())),
        vec![
            "Member States shall ensure that equality bodies:",
            "(a)are independent;",
            "(b)have sufficient resources.",
        ]
    );

    let signature = doc.conclusions.as_ref().and_then(Conclusion::signature).unwrap();
    assert_eq!(
        signature,
        &Signature {
            place: Some("Done at Strasbourg,".to_string()),
            date: Some("14 May 2024".to_string()),
            signatory: Some("For the European Parliament".to_string()),
            title: Some("The President".to_string()),
        }
    );
}

#[test]
fn test_renumbered_children_follow_positions() {
    for (dialect, name) in [
        ("formex", "directive.xml"),
        ("boe", "ley.xml"),
        ("cellar", "regulation.html"),
        ("cellar-standard", "decision.html"),
        ("proposal", "com.html"),
    ] {
        let parsed = convert(dialect, name);
        assert!(!parsed.document.articles.is_empty(), "{dialect}/{name}");
        for (i, article) in parsed.document.articles.iter().enumerate() {
            for (j, child) in article.children.iter().enumerate() {
                assert_eq!(
                    child.e_id,
                    format!("{:03}.{:03}", i + 1, j + 1),
                    "{dialect}/{name} article {}",
                    article.e_id
                );
            }
        }
    }
}

#[test]
fn test_top_level_chapters_only() {
    let akn = convert("akn", "regulation.xml");
    assert_eq!(ids(akn.document.chapters.iter().map(|c| c.e_id.as_str())), vec!["chp_I"]);
    assert!(akn.document.chapters.iter().all(|c| !c.e_id.contains("__")));

    let cellar = convert("cellar", "regulation.html");
    assert_eq!(ids(cellar.document.chapters.iter().map(|c| c.e_id.as_str())), vec!["cpt_1"]);
    assert!(cellar.document.chapters.iter().all(|c| !c.e_id.contains('.')));
}

#[test]
fn test_annex_preface_drops_articles() {
    let annex = convert("formex", "annex.xml");
    assert_eq!(annex.document.preface.as_deref(), Some("ANNEX IV"));
    assert!(annex.document.articles.is_empty());

    // Two trailing words keep the articles.
    let dir = tempdir().unwrap();
    let path = dir.path().join("annex_part.xml");
    fs::write(
        &path,
        load_fixture("formex", "annex.xml").replace("ANNEX IV", "ANNEX II Part A"),
    )
    .unwrap();
    let parsed = create_parser(Some("formex"), &path).unwrap().parse(&path).unwrap();
    assert_eq!(parsed.document.articles.len(), 1);
}

#[test]
fn test_malformed_recitals_keep_articles() {
    let parsed = convert("formex", "malformed_recitals.xml");
    let doc = &parsed.document;

    assert!(!parsed.failed(Step::Articles));
    assert_eq!(doc.articles.len(), 1);
    assert_eq!(
        doc.articles[0].children[0].text,
        "This Regulation shall enter into force on the day following its publication."
    );
    assert!(doc.recitals.iter().all(|r| r.text.is_empty()));
    assert_eq!(doc.formula.as_deref(), Some("THE EUROPEAN COMMISSION,"));
}

#[test]
fn test_akoma_ntoso_regulation() {
    let parsed = convert("akn", "regulation.xml");
    assert!(parsed.is_complete(), "{:?}", parsed.failures);
    let doc = &parsed.document;

    assert_eq!(
        doc.preface.as_deref(),
        Some("Regulation (EU) 2024/1689 of the European Parliament and of the Council laying down harmonised rules on artificial intelligence")
    );
    assert_eq!(doc.preamble_final.as_deref(), Some("HAVE ADOPTED THIS REGULATION:"));
    assert_eq!(
        doc.citations[0].text,
        "Having regard to the Treaty on the Functioning of the European Union,"
    );
    assert_eq!(ids(doc.recitals.iter().map(|r| r.e_id.as_str())), vec!["rct_1", "rct_2"]);

    assert_eq!(ids(doc.articles.iter().map(|a| a.e_id.as_str())), vec!["art_1", "art_2"]);
    assert_eq!(
        ids(doc.articles[0].children.iter().map(|c| c.e_id.as_str())),
        vec!["art_1__para_1", "art_1__para_2"]
    );

    let amended: Vec<_> = doc.articles[1]
        .children
        .iter()
        .map(|c| (c.e_id.as_str(), c.amendment))
        .collect();
    assert_eq!(
        amended,
        vec![("art_2__para_1", Some(false)), ("art_2__mod_1", Some(true))]
    );

    assert_eq!(
        doc.conclusions,
        Some(Conclusion::Blocks {
            date: Some("13 June 2024".to_string()),
            signatures: vec![
                vec!["This Regulation shall be binding in its entirety and directly applicable in all Member States.".to_string()],
                vec!["Done at Brussels, 13 June 2024.".to_string()],
                vec!["For the European Parliament".to_string(), "The President".to_string()],
                vec!["For the Council".to_string(), "The President".to_string()],
            ],
        })
    );
}

#[test]
fn test_akoma_ntoso_variants() {
    let german = convert("akn", "german.xml");
    assert_eq!(german.dialect, "german");
    assert_eq!(
        german.document.preface.as_deref(),
        Some("Gesetz zur Regelung des Verbraucherschutzes")
    );
    assert_eq!(
        german.document.formula.as_deref(),
        Some("Der Bundestag hat das folgende Gesetz beschlossen:")
    );
    let article = &german.document.articles[0];
    assert_eq!(article.num.as_deref(), Some("§ 1"));
    assert_eq!(article.heading.as_deref(), Some("Anwendungsbereich"));
    assert_eq!(
        ids(article.children.iter().map(|c| c.text.as_str())),
        vec![
            "Dieses Gesetz gilt für Verbraucherverträge.",
            "Es tritt am Tag nach der Verkündung in Kraft.",
        ]
    );

    let eu = convert("akn", "akn4eu.xml");
    assert_eq!(eu.document.citations[0].e_id, "cit_1");
    assert_eq!(
        ids(eu.document.articles[0].children.iter().map(|c| c.e_id.as_str())),
        vec!["art_1_para_1", "art_1_para_2"]
    );

    let lux = convert("akn", "luxembourg.xml");
    assert_eq!(
        lux.document.formula.as_deref(),
        Some("Nous Henri, Grand-Duc de Luxembourg, Duc de Nassau,")
    );
    let children: Vec<_> = lux.document.articles[0]
        .children
        .iter()
        .map(|c| (c.e_id.as_str(), c.text.as_str()))
        .collect();
    assert_eq!(
        children,
        vec![
            ("art_1_al_1", "Le Code du travail est modifié comme suit :"),
            ("art_1_al_2", "Sont insérés :"),
            ("art_1_al_2_pt_1", "un nouvel alinéa 3;"),
            ("art_1_al_2_pt_2", "un nouvel alinéa 4."),
        ]
    );
    assert_eq!(lux.document.articles[1].num.as_deref(), Some("Art. 2."));
}

#[test]
fn test_boe_ley() {
    let parsed = convert("boe", "ley.xml");
    let doc = &parsed.document;

    assert_eq!(doc.preface.as_deref(), Some("FELIPE VI\nREY DE ESPAÑA"));
    assert_eq!(doc.articles.len(), 2);
    assert_eq!(doc.articles[0].num.as_deref(), Some("Artículo 1. Objeto."));
    assert_eq!(doc.articles[0].children.len(), 2);
    assert_eq!(
        doc.articles[1].children[0].text,
        "La presente ley entrará en vigor al día siguiente."
    );
    assert!(doc.citations.is_empty());
    assert_eq!(doc.conclusions, None);
}

#[test]
fn test_cellar_regulation() {
    let parsed = convert("cellar", "regulation.html");
    let doc = &parsed.document;

    assert_eq!(
        doc.preface.as_deref(),
        Some("REGULATION (EU) 2024/903 OF THE EUROPEAN PARLIAMENT AND OF THE COUNCIL of 13 March 2024")
    );
    assert_eq!(
        doc.citations[1].text,
        "Having regard to the opinion of the Committee of the Regions,"
    );
    assert_eq!(
        doc.recitals[1].text,
        "The \"Interoperable Europe\" framework supports that goal."
    );
    assert_eq!(doc.preamble_final.as_deref(), Some("HAVE ADOPTED THIS REGULATION:"));

    assert_eq!(doc.articles.len(), 2);
    assert_eq!(doc.articles[0].heading.as_deref(), Some("Subject matter and scope"));
    assert_eq!(
        ids(doc.articles[1].children.iter().map(|c| c.text.as_str())),
        vec![
            "For the purposes of this Regulation:",
            "(1) 'interoperability' means the ability to cooperate;",
        ]
    );
    assert_eq!(
        doc.conclusions,
        Some(Conclusion::text(
            "This Regulation shall be binding in its entirety. Done at Strasbourg, 13 March 2024."
        ))
    );
}

#[test]
fn test_cellar_standard_groups_points() {
    let parsed = convert("cellar-standard", "decision.html");
    let doc = &parsed.document;

    assert_eq!(
        doc.preface.as_deref(),
        Some("Council Decision of 5 May 2010 on the signing of an agreement")
    );
    assert_eq!(doc.citations.len(), 2);
    assert_eq!(ids(doc.recitals.iter().map(|r| r.e_id.as_str())), vec!["rct_1", "rct_2"]);

    assert_eq!(
        ids(doc.articles[0].children.iter().map(|c| c.text.as_str())),
        vec![
            "First paragraph.",
            "(a) First point\n(b) Second point",
            "Second paragraph.",
        ]
    );
    assert_eq!(doc.articles[1].heading.as_deref(), Some("Entry into force"));
    assert_eq!(doc.articles[1].children.len(), 1);
    assert_eq!(
        doc.conclusions,
        Some(Conclusion::text(
            "Done at Brussels, 5 May 2010. For the Council The President"
        ))
    );
}

#[test]
fn test_proposal_with_memorandum() {
    let parsed = convert("proposal", "com.html");
    let doc = &parsed.document;

    assert_eq!(
        doc.preface.as_deref(),
        Some("Proposal for a COUNCIL DECISION on the position to be taken on behalf of the European Union in the Joint Committee")
    );
    assert_eq!(doc.citations.len(), 2);
    assert_eq!(doc.recitals[1].num.as_deref(), Some("(2)"));
    assert_eq!(ids(doc.articles.iter().map(|a| a.e_id.as_str())), vec!["001", "002"]);
    assert_eq!(doc.articles[0].heading.as_deref(), Some("Position"));
    assert_eq!(
        doc.conclusions,
        Some(Conclusion::text("Done at Brussels, For the Council The President"))
    );

    let metadata = doc.metadata.as_ref().unwrap();
    assert_eq!(metadata["com_reference"], "COM(2025) 6 final");
    assert_eq!(metadata["status"], "Proposal for a");

    let memorandum = doc.explanatory_memorandum.as_ref().unwrap();
    assert_eq!(memorandum.title.as_deref(), Some("EXPLANATORY MEMORANDUM"));
    assert_eq!(memorandum.sections.len(), 2);
}

#[test]
fn test_regional_missing_conclusions_is_isolated() {
    let parsed = convert("regional", "legge.html");
    let doc = &parsed.document;

    assert_eq!(doc.preface.as_deref(), Some("Legge regionale 1 marzo 2024, n. 5"));
    assert_eq!(doc.recitals[0].text, "Norme in materia di tutela del paesaggio");
    assert_eq!(doc.chapters[0].heading.as_deref(), Some("Disposizioni generali"));
    assert_eq!(doc.articles.len(), 2);
    assert_eq!(doc.articles[1].heading.as_deref(), Some("Entrata in vigore"));
    assert_eq!(
        ids(doc.articles[0].children.iter().map(|c| c.text.as_str())),
        vec![
            "1. La Regione tutela il paesaggio.",
            "2. La Regione promuove la conoscenza del territorio.",
        ]
    );

    assert!(parsed.failed(Step::Conclusions));
    assert_eq!(parsed.failures.len(), 1);
    assert_eq!(doc.conclusions, None);
}

#[test]
fn test_every_fixture_is_valid_legaljson() {
    let validator = LegalJsonValidator::new().unwrap();
    for (dialect, name) in [
        ("formex", "directive.xml"),
        ("akn", "regulation.xml"),
        ("akn", "luxembourg.xml"),
        ("boe", "ley.xml"),
        ("cellar", "regulation.html"),
        ("cellar-standard", "decision.html"),
        ("proposal", "com.html"),
        ("regional", "legge.html"),
    ] {
        let parsed = convert(dialect, name);
        let (valid, errors) = validator.validate(&parsed.document).unwrap();
        assert!(valid, "{dialect}/{name}: {errors:?}");
    }
}

#[test]
fn test_source_schema_failure_is_recoverable() {
    let schema = cached_validator(&fixture("akn", "act-subset.xsd"), "xsd").unwrap();
    let options = ParseOptions::with_schema(schema);

    let path = fixture("akn", "regulation.xml");
    let parsed = create_parser(None, &path)
        .unwrap()
        .parse_with_options(&path, &options)
        .unwrap();
    assert_eq!(parsed.valid, Some(false));
    assert_eq!(parsed.validation_errors.len(), 1);
    assert!(parsed.validation_errors[0].starts_with("Line 40: "));
    assert!(parsed.validation_errors[0].contains("mod': This element is not expected."));
    assert_eq!(parsed.document.articles.len(), 2);

    // German LegalDocML never checks a supplied schema.
    let german = fixture("akn", "german.xml");
    let parsed = create_parser(None, &german)
        .unwrap()
        .parse_with_options(&german, &options)
        .unwrap();
    assert_eq!(parsed.valid, None);
    assert!(parsed.is_complete());
}

#[test]
fn test_directory_input_selects_act() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_metadata.xml"), "<metadata><title>x</title></metadata>").unwrap();
    fs::write(
        dir.path().join("b_act.xml"),
        load_fixture("formex", "directive.xml"),
    )
    .unwrap();

    assert_eq!(detect(dir.path()).unwrap(), "formex");
    let parsed = create_parser(None, dir.path()).unwrap().parse(dir.path()).unwrap();
    assert_eq!(parsed.source, dir.path().join("b_act.xml"));
    assert_eq!(parsed.document.articles.len(), 2);
}

#[test]
fn test_fatal_errors() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("broken.xml");
    fs::write(&broken, "<ACT><TITLE>").unwrap();
    let err = create_parser(Some("formex"), &broken)
        .unwrap()
        .parse(&broken)
        .unwrap_err();
    assert!(matches!(err, ParserError::Parse { .. }));
    assert!(err.is_fatal());

    let err = create_parser(Some("regional"), &fixture("cellar", "regulation.html"))
        .unwrap()
        .parse(&fixture("cellar", "regulation.html"))
        .unwrap_err();
    assert!(matches!(err, ParserError::DialectMismatch { .. }));

    assert!(matches!(
        create_parser(Some("docx"), &broken),
        Err(ParserError::UnknownFormat(_))
    ));
}
