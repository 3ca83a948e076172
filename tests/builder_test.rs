use artxml::builder::{ArticleMeta, Author, SchemaTree, build_article};
use artxml::config::Config;
use artxml::document::{StyledParagraph, read_paragraphs};
use artxml::tree::Element;

#[cfg(test)]
mod builder_tests {
    use super::*;

    fn paras(items: &[(&str, &str)]) -> Vec<StyledParagraph> {
        items.iter().map(|&item| item.into()).collect()
    }

    fn build(items: &[(&str, &str)]) -> SchemaTree {
        build_article(paras(items), &ArticleMeta::default(), &Config::default())
    }

    fn sections(tree: &SchemaTree) -> Vec<&Element> {
        tree.root()
            .find_path("body/ce:sections")
            .unwrap()
            .find_all("ce:section")
            .collect()
    }

    fn figures(tree: &SchemaTree) -> Vec<&Element> {
        tree.root()
            .find("ce:floats")
            .map(|floats| floats.find_all("ce:figure").collect())
            .unwrap_or_default()
    }

    fn id_number(id: &str) -> u32 {
        id.trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .parse()
            .unwrap()
    }

    #[test]
    fn test_title_section_paragraph_and_caption() {
        let tree = build(&[
            ("Title", "Title"),
            ("1. Introduction", "Normal"),
            ("Some text.", "Normal"),
            ("Fig. 2: Sample image", "Caption"),
        ]);

        let head = tree.root().find("head").unwrap();
        assert_eq!(head.find("ce:title").unwrap().text(), "Title");

        let sections = sections(&tree);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].attribute("id"), Some("s0010"));
        let title = sections[0].find("ce:section-title").unwrap();
        assert_eq!(title.text(), "1. Introduction");
        assert_eq!(title.attribute("id"), Some("st0010"));

        let paras: Vec<_> = sections[0].find_all("ce:para").collect();
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].attribute("id"), Some("p0010"));
        assert_eq!(paras[0].text(), "Some text.");

        let figures = figures(&tree);
        assert_eq!(figures.len(), 1);
        let figure = figures[0];
        assert_eq!(figure.attribute("id"), Some("f0005"));
        assert_eq!(figure.find("ce:label").unwrap().text(), "Fig. 2");
        let simple_para = figure.find_path("ce:caption/ce:simple-para").unwrap();
        assert_eq!(simple_para.text(), "Sample image");
        assert_eq!(simple_para.attribute("id"), Some("sp0005"));
        assert_eq!(
            figure.find("ce:caption").unwrap().attribute("id"),
            Some("ca0005")
        );
        assert_eq!(
            figure.find("ce:link").unwrap().attribute("locator"),
            Some("gr2")
        );
    }

    #[test]
    fn test_captions_stay_out_of_sections() {
        let tree = build(&[
            ("Title", "Title"),
            ("Methods", "Heading 1"),
            ("Figure 1. Setup", "Caption"),
            ("We measured.", "Normal"),
        ]);
        let sections = sections(&tree);
        let texts: Vec<_> = sections[0].find_all("ce:para").map(Element::text).collect();
        assert_eq!(texts, vec!["We measured."]);
    }

    #[test]
    fn test_same_input_builds_identical_trees() {
        let items = [
            ("A study", "Title"),
            ("Opening.", "Normal"),
            ("Background", "Heading 1"),
            ("Fig. 3 Flow", "Caption"),
            ("More.", "Normal"),
            ("2. Results", "Normal"),
            ("Fig. 1 Map", "Caption"),
        ];
        let meta = ArticleMeta {
            doi: Some("10.1016/j.chaos.2024.115581".to_string()),
            ..ArticleMeta::default()
        };
        let config = Config::default();

        let first = build_article(paras(&items), &meta, &config);
        let second = build_article(paras(&items), &meta, &config);
        assert_eq!(first, second);
        assert_eq!(first.to_xml(&config).unwrap(), second.to_xml(&config).unwrap());
    }

    #[test]
    fn test_ids_increase_in_document_order() {
        let tree = build(&[
            ("Title", "Title"),
            ("Lead-in.", "Normal"),
            ("1. One", "Normal"),
            ("a", "Normal"),
            ("b", "Normal"),
            ("Fig. 9 late", "Caption"),
            ("2. Two", "Heading 2"),
            ("Fig. 4 early", "Caption"),
            ("c", "Normal"),
            ("3. Three", "Normal"),
            ("Figure 4: again", "Caption"),
        ]);

        let section_ids: Vec<u32> = sections(&tree)
            .iter()
            .map(|s| id_number(s.attribute("id").unwrap()))
            .collect();
        assert_eq!(section_ids, vec![10, 20, 30, 40]);

        let para_ids: Vec<u32> = sections(&tree)
            .iter()
            .flat_map(|s| s.find_all("ce:para"))
            .map(|p| id_number(p.attribute("id").unwrap()))
            .collect();
        assert!(para_ids.windows(2).all(|w| w[1] == w[0] + 10));

        let figure_ids: Vec<u32> = figures(&tree)
            .iter()
            .map(|f| id_number(f.attribute("id").unwrap()))
            .collect();
        assert_eq!(figure_ids, vec![5, 10, 15]);
    }

    #[test]
    fn test_locator_follows_caption_number_not_order() {
        let tree = build(&[
            ("Title", "Title"),
            ("Fig. 7: Seventh", "Caption"),
            ("Fig. 3: Third", "Caption"),
        ]);
        let figures = figures(&tree);
        assert_eq!(figures[0].attribute("id"), Some("f0005"));
        assert_eq!(
            figures[0].find("ce:link").unwrap().attribute("locator"),
            Some("gr7")
        );
        assert_eq!(figures[1].attribute("id"), Some("f0010"));
        assert_eq!(
            figures[1].find("ce:link").unwrap().attribute("locator"),
            Some("gr3")
        );
        assert_eq!(tree.largest_figure(), 7);
    }

    #[test]
    fn test_empty_caption_text_falls_back_to_figure_number() {
        let tree = build(&[("Title", "Title"), ("Figure 5", "Caption")]);
        let figure = figures(&tree)[0];
        assert_eq!(
            figure.find_path("ce:caption/ce:simple-para").unwrap().text(),
            "Figure 5"
        );
    }

    #[test]
    fn test_metadata_overlay_wins() {
        let meta = ArticleMeta {
            jid: Some("PHYSA".to_string()),
            aid: Some("42".to_string()),
            pii: Some("S0378-4371(24)00001-2".to_string()),
            doi: Some("10.1016/j.physa.2024.00001".to_string()),
            article_number: Some("130001".to_string()),
            title: Some("Overlay title".to_string()),
            copyright_year: Some("2025".to_string()),
            authors: vec![Author {
                degrees: Some("PhD".to_string()),
                given_name: Some("Ada".to_string()),
                surname: Some("Lovelace".to_string()),
                email: Some("ada@example.org".to_string()),
            }],
        };
        let tree = build_article(
            paras(&[("Document title", "Title"), ("Body.", "Normal")]),
            &meta,
            &Config::default(),
        );

        let info = tree.root().find("item-info").unwrap();
        let children: Vec<_> = info.elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(
            children,
            vec!["jid", "aid", "ce:article-number", "ce:pii", "ce:doi", "ce:copyright"]
        );
        assert_eq!(info.find("jid").unwrap().text(), "PHYSA");
        assert_eq!(
            info.find("ce:copyright").unwrap().attribute("year"),
            Some("2025")
        );

        let head = tree.root().find("head").unwrap();
        assert_eq!(head.find("ce:title").unwrap().text(), "Overlay title");
        let author = head.find_path("ce:author-group/ce:author").unwrap();
        let parts: Vec<_> = author.elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(
            parts,
            vec!["ce:degrees", "ce:given-name", "ce:surname", "ce:e-address"]
        );
    }

    #[test]
    fn test_defaults_come_from_config() {
        let mut config = Config::default();
        config.publisher.jid = "TEST".to_string();
        config.publisher.version = "5.7".to_string();

        let tree = build_article(paras(&[("T", "Title")]), &ArticleMeta::default(), &config);
        assert_eq!(tree.root().attribute("version"), Some("5.7"));
        assert_eq!(tree.root().attribute("docsubtype"), Some("fla"));
        assert_eq!(tree.root().attribute("xml:lang"), Some("en"));
        let info = tree.root().find("item-info").unwrap();
        assert_eq!(info.find("jid").unwrap().text(), "TEST");
        assert!(info.find("ce:doi").is_none());
        assert!(info.find("ce:article-number").is_none());
    }

    #[test]
    fn test_output_preamble_and_layout() {
        let config = Config::default();
        let tree = build(&[
            ("Title", "Title"),
            ("Fig. 30: Wide", "Caption"),
            ("Text.", "Normal"),
        ]);
        let xml = tree.to_xml(&config).unwrap();

        assert!(xml.starts_with(
            "<?xml version='1.0' encoding='UTF-8'?>\n<!DOCTYPE article PUBLIC \
             \"-//ES//DTD journal article DTD version 5.6.0//EN//XML\" \"art560.dtd\" [\n"
        ));
        assert!(xml.contains("<!ENTITY gr30 SYSTEM \"gr30\" NDATA IMAGE>"));
        assert!(!xml.contains("<!ENTITY gr31 "));
        assert!(xml.contains("<!ENTITY fx1 SYSTEM \"fx1\" NDATA IMAGE>]>\n<article "));
        assert!(xml.contains(
            "<article xmlns=\"http://www.elsevier.com/xml/ja/dtd\" \
             xmlns:ce=\"http://www.elsevier.com/xml/common/dtd\""
        ));
        assert!(xml.contains("\n  <item-info>\n    <jid>CHAOS</jid>"));
        assert!(xml.contains("<ce:para id=\"p0010\">Text.</ce:para>"));
        assert!(xml.ends_with("</article>\n"));
    }

    #[test]
    fn test_large_caption_number_keeps_preamble_small() {
        let config = Config::default();
        let tree = build(&[("Title", "Title"), ("Fig. 2000000: big", "Caption")]);
        let xml = tree.to_xml(&config).unwrap();

        assert_eq!(tree.largest_figure(), 2_000_000);
        assert!(xml.contains("<!ENTITY gr22 SYSTEM \"gr22\" NDATA IMAGE>\n<!ENTITY gr2000000 "));
        assert!(!xml.contains("<!ENTITY gr23 "));
        assert_eq!(xml.matches("<!ENTITY ").count(), 22 + 1 + 1);
        assert!(xml.len() < 10_000);
    }

    #[test]
    fn test_docx_to_tree() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buf = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("A docx article")))
            .add_paragraph(Paragraph::new())
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("1. Introduction")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("First paragraph.")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let paragraphs = read_paragraphs(buf.get_ref()).unwrap();
        let tree = build_article(paragraphs, &ArticleMeta::default(), &Config::default());

        let head = tree.root().find("head").unwrap();
        assert_eq!(head.find("ce:title").unwrap().text(), "A docx article");
        let sections = sections(&tree);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].find("ce:para").unwrap().text(),
            "First paragraph."
        );
    }
}
