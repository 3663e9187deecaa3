use crate::constants::{LAST_UPDATE_LABEL, THROUGH_POND_HATCH_LABEL, THROUGH_TURBINE_LABEL};
use crate::error::{Result, ScrapeError};
use crate::types::{FlowImages, ImageRef};
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Locates the three value images on the page by their text-label anchors.
///
/// Partial results are not acceptable: if any of the three references is
/// missing the cycle must abort rather than store incomplete data.
pub fn locate_flow_images(html: &str) -> Result<FlowImages> {
    let document = Html::parse_document(html);

    let last_update = find_labeled_image(&document, LAST_UPDATE_LABEL);
    let through_turbine = find_labeled_image(&document, THROUGH_TURBINE_LABEL);
    let through_pond_hatch = find_labeled_image(&document, THROUGH_POND_HATCH_LABEL);

    match (last_update, through_turbine, through_pond_hatch) {
        (Some(last_update), Some(through_turbine), Some(through_pond_hatch)) => Ok(FlowImages {
            last_update,
            through_turbine,
            through_pond_hatch,
        }),
        (lu, tt, tp) => {
            for (label, found) in [
                (LAST_UPDATE_LABEL, lu.is_some()),
                (THROUGH_TURBINE_LABEL, tt.is_some()),
                (THROUGH_POND_HATCH_LABEL, tp.is_some()),
            ] {
                if !found {
                    warn!(label, "no image anchored to label - the page structure may have changed");
                }
            }
            Err(ScrapeError::Locator(
                "missing required data elements".to_string(),
            ))
        }
    }
}

/// Label-then-sibling traversal: an element whose text contains the label,
/// followed by its structurally-next element sibling, which must carry an
/// `img` descendant with a `src` attribute.
///
/// Candidates are tried in document order; ancestors that merely contain the
/// label text fall through because their next sibling carries no image.
fn find_labeled_image(document: &Html, label: &str) -> Option<ImageRef> {
    let img_selector = Selector::parse("img").unwrap();

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.text().collect::<String>().contains(label))
        .find_map(|el| {
            let sibling = el.next_siblings().find_map(ElementRef::wrap)?;
            let img = sibling.select(&img_selector).next()?;
            img.value()
                .attr("src")
                .map(|src| ImageRef(src.to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><head></head><body>{}</body></html>", body)
    }

    #[test]
    fn locates_all_three_images() {
        let html = page(
            r#"
            <div class="fact-label">Last update</div>
            <div class="fact-data"><img src="/img/updated.png"></div>
            <div class="fact-label">Through turbine</div>
            <div class="fact-data"><img src="/img/turbine.png"></div>
            <div class="fact-label">Through pond hatch</div>
            <div class="fact-data"><img src="/img/hatch.png"></div>
            "#,
        );

        let images = locate_flow_images(&html).unwrap();
        assert_eq!(images.last_update.as_str(), "/img/updated.png");
        assert_eq!(images.through_turbine.as_str(), "/img/turbine.png");
        assert_eq!(images.through_pond_hatch.as_str(), "/img/hatch.png");
    }

    #[test]
    fn label_nested_in_span_still_anchors() {
        let html = page(
            r#"
            <div><span>Last update</span></div>
            <div><p><img src="a.png"></p></div>
            <div>Through turbine</div>
            <div><img src="b.png"></div>
            <div>Through pond hatch</div>
            <div><img src="c.png"></div>
            "#,
        );

        let images = locate_flow_images(&html).unwrap();
        assert_eq!(images.last_update.as_str(), "a.png");
    }

    #[test]
    fn missing_pond_hatch_structure_is_a_locator_error() {
        // Pond hatch label present but its sibling carries no image.
        let html = page(
            r#"
            <div>Last update</div>
            <div><img src="a.png"></div>
            <div>Through turbine</div>
            <div><img src="b.png"></div>
            <div>Through pond hatch</div>
            <div>no image here</div>
            "#,
        );

        let err = locate_flow_images(&html).unwrap_err();
        assert!(matches!(err, ScrapeError::Locator(_)));
        assert!(err.to_string().contains("missing required data elements"));
    }

    #[test]
    fn label_with_no_following_sibling_does_not_match() {
        let html = page(
            r#"
            <div>Last update</div>
            <div><img src="a.png"></div>
            <div>Through turbine</div>
            <div><img src="b.png"></div>
            <div><div>Through pond hatch</div></div>
            "#,
        );

        assert!(locate_flow_images(&html).is_err());
    }

    #[test]
    fn text_between_label_and_image_div_does_not_break_anchoring() {
        // Whitespace and text nodes between the label and the data div are
        // skipped; only the next *element* sibling counts.
        let html = page(
            "<div>Last update</div>\n  stray text\n<div><img src='a.png'></div>\
             <div>Through turbine</div><div><img src='b.png'></div>\
             <div>Through pond hatch</div><div><img src='c.png'></div>",
        );

        let images = locate_flow_images(&html).unwrap();
        assert_eq!(images.last_update.as_str(), "a.png");
        assert_eq!(images.through_pond_hatch.as_str(), "c.png");
    }
}
