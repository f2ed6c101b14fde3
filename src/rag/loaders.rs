//! Source document loaders

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::{Document, RagError, Result};

#[derive(Debug, Deserialize)]
struct ReviewRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Rating")]
    rating: String,
    #[serde(rename = "Review")]
    review: String,
}

/// Restaurant reviews, one document per row; id is the row index
pub fn load_reviews_csv(path: &Path) -> Result<Vec<Document>> {
    let csv_err = |source| RagError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;

    let mut docs = Vec::new();
    for (i, row) in reader.deserialize::<ReviewRow>().enumerate() {
        let row = row.map_err(csv_err)?;
        let rating = row
            .rating
            .trim()
            .parse::<i64>()
            .map(serde_json::Value::from)
            .unwrap_or_else(|_| serde_json::Value::from(row.rating.clone()));
        docs.push(
            Document::new(i.to_string(), format!("{} {}", row.title, row.review))
                .with_metadata("rating", rating)
                .with_metadata("date", row.date),
        );
    }
    info!("Loaded {} reviews from {}", docs.len(), path.display());
    Ok(docs)
}

/// Pages of a text export, separated by form feeds; blank pages are skipped
pub fn load_text_pages(path: &Path) -> Result<Vec<Document>> {
    let text = std::fs::read_to_string(path).map_err(|source| RagError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let source = path.display().to_string();
    let pages = text
        .split('\u{c}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(n, page)| {
            Document::new(format!("page{}", n), page.trim())
                .with_metadata("source", source.clone())
                .with_metadata("page", n)
        })
        .collect();
    Ok(pages)
}

/// One document per PDF page, text extracted with lopdf; blank pages are skipped
pub fn load_pdf_pages(path: &Path) -> Result<Vec<Document>> {
    let pdf_err = |source| RagError::Pdf {
        path: path.to_path_buf(),
        source,
    };
    let pdf = lopdf::Document::load(path).map_err(pdf_err)?;
    let source = path.display().to_string();

    let mut pages = Vec::new();
    for page_number in pdf.get_pages().into_keys() {
        let text = pdf.extract_text(&[page_number]).map_err(pdf_err)?;
        if text.trim().is_empty() {
            continue;
        }
        // Zero-based like the text loader
        let n = page_number.saturating_sub(1);
        pages.push(
            Document::new(format!("page{}", n), text.trim())
                .with_metadata("source", source.clone())
                .with_metadata("page", n),
        );
    }
    info!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// Pages of `path`: PDF by extension, form-feed separated text otherwise
pub fn load_pages(path: &Path) -> Result<Vec<Document>> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        load_pdf_pages(path)
    } else {
        load_text_pages(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reviews_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        std::fs::write(
            &path,
            "Title,Date,Rating,Review\n\
             Best slice in town,2024-03-01,5,\"Crispy crust, fresh basil.\"\n\
             Meh,2024-03-04,2,Cold by the time it arrived.\n",
        )
        .unwrap();

        let docs = load_reviews_csv(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "0");
        assert_eq!(docs[0].content, "Best slice in town Crispy crust, fresh basil.");
        assert_eq!(docs[1].metadata["rating"], 2);
        assert_eq!(docs[1].metadata["date"], "2024-03-04");
    }

    #[test]
    fn test_missing_csv() {
        let err = load_reviews_csv(Path::new("/nonexistent/reviews.csv")).unwrap_err();
        assert!(matches!(err, RagError::Csv { .. }));
    }

    #[test]
    fn test_text_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.txt");
        std::fs::write(&path, "Session 1\nIntro\u{c}\u{c}  \u{c}Pricing models\n").unwrap();

        let pages = load_text_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].content, "Session 1\nIntro");
        assert_eq!(pages[1].content, "Pricing models");
        assert_eq!(pages[1].metadata["page"], 3);
    }

    fn write_pdf(path: &Path, pages: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Object, Stream};

        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
            ];
            if !text.is_empty() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            }
            operations.push(Operation::new("ET", vec![]));
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_pdf_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pdf");
        write_pdf(&path, &["Time value of money", "", "Black Scholes pricing"]);

        let pages = load_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].content.contains("Time value of money"));
        assert!(pages[1].content.contains("Black Scholes pricing"));
        assert_eq!(pages[0].metadata["page"], 0);
        assert_eq!(pages[1].metadata["page"], 2);
        assert_eq!(pages[1].metadata["source"], path.display().to_string());
    }

    #[test]
    fn test_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "plain text, not a PDF").unwrap();
        assert!(matches!(load_pages(&path), Err(RagError::Pdf { .. })));
    }

    #[test]
    fn test_missing_pages_file() {
        assert!(matches!(
            load_text_pages(Path::new("/nonexistent/slides.txt")),
            Err(RagError::Load { .. })
        ));
    }
}
