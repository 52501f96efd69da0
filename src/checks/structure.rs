//! Structure and image checks

use super::{has_value, plural, style_declarations, CheckResult};
use crate::issue::Finding;
use crate::page::{ImageMetrics, Page};
use crate::rules::RuleId;
use scraper::ElementRef;
use std::collections::HashMap;

/// Elements removed from or obsoleted by the HTML living standard
const DEPRECATED_ELEMENTS: &[&str] = &[
    "acronym", "applet", "basefont", "bgsound", "big", "blink", "center", "dir", "font", "frame",
    "frameset", "isindex", "marquee", "nobr", "noframes", "spacer", "strike", "tt",
];

/// Unsized images tolerated before the page is flagged
const MAX_UNSIZED_IMAGES: usize = 3;

/// Rendered size below which an image counts as an icon
const MIN_TRACKED_IMAGE_PX: f64 = 50.0;

/// Allowed relative difference between displayed and natural aspect ratio
const ASPECT_RATIO_TOLERANCE: f64 = 0.05;

pub fn check_deprecated_elements(page: &Page) -> CheckResult {
    let mut first_seen: Vec<(&str, ElementRef<'_>, usize)> = Vec::new();

    for el in page.elements() {
        let name = el.value().name();
        if !DEPRECATED_ELEMENTS.contains(&name) {
            continue;
        }
        match first_seen.iter_mut().find(|(tag, _, _)| *tag == name) {
            Some(entry) => entry.2 += 1,
            None => first_seen.push((name, el, 1)),
        }
    }

    Ok(first_seen
        .into_iter()
        .map(|(tag, el, count)| {
            Finding::new(
                RuleId::DeprecatedElement,
                format!(
                    "Deprecated <{}> element used ({})",
                    tag,
                    plural(count, "occurrence", "occurrences")
                ),
            )
            .at(page.element_info(el))
            .with_fix(replacement_hint(tag))
        })
        .collect())
}

fn replacement_hint(tag: &str) -> String {
    let hint = match tag {
        "font" | "basefont" => "Use CSS font properties",
        "center" => "Use CSS text-align or flexbox",
        "big" | "tt" => "Use CSS font-size or font-family",
        "strike" => "Use <s> or <del>",
        "acronym" => "Use <abbr>",
        "marquee" | "blink" => "Remove the animation or use CSS animations that respect reduced motion",
        "applet" => "Use <object> or <embed>",
        "frame" | "frameset" | "noframes" => "Use <iframe> or a single-document layout",
        "dir" => "Use <ul>",
        "nobr" => "Use CSS white-space: nowrap",
        _ => "Replace with a standard element styled with CSS",
    };
    format!("{} instead of <{}>", hint, tag)
}

pub fn check_broken_images(page: &Page) -> CheckResult {
    Ok(page
        .select("img")?
        .into_iter()
        .filter(|img| !has_value(img.value().attr("src")))
        .map(|img| {
            let message = if img.value().attr("src").is_some() {
                "Image has an empty src attribute"
            } else {
                "Image has no src attribute"
            };
            Finding::new(RuleId::BrokenImage, message).at(page.element_info(img))
        })
        .collect())
}

pub fn check_duplicate_ids(page: &Page) -> CheckResult {
    let mut by_id: Vec<(&str, ElementRef<'_>, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for el in page.elements() {
        let id = match el.value().attr("id") {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        match index.get(id) {
            Some(&i) => by_id[i].2 += 1,
            None => {
                index.insert(id, by_id.len());
                by_id.push((id, el, 1));
            }
        }
    }

    Ok(by_id
        .into_iter()
        .filter(|(_, _, count)| *count > 1)
        .map(|(id, el, count)| {
            Finding::new(
                RuleId::DuplicateId,
                format!("The id \"{}\" is used by {} elements", id, count),
            )
            .at(page.element_info(el))
        })
        .collect())
}

pub fn check_unsized_images(page: &Page) -> CheckResult {
    let unsized_images: Vec<ElementRef<'_>> = page
        .select("img")?
        .into_iter()
        .filter(|img| !is_sized(*img))
        .filter(|img| !page.image_metrics(*img).is_some_and(is_icon))
        .collect();

    if unsized_images.len() <= MAX_UNSIZED_IMAGES {
        return Ok(Vec::new());
    }

    Ok(vec![Finding::new(
        RuleId::UnsizedImages,
        format!(
            "{} without explicit width and height cause layout shifts",
            plural(unsized_images.len(), "image", "images")
        ),
    )
    .at(page.element_info(unsized_images[0]))])
}

/// Width and height both declared, each by attribute or inline style
fn is_sized(img: ElementRef<'_>) -> bool {
    let styles = img
        .value()
        .attr("style")
        .map(style_declarations)
        .unwrap_or_default();
    let declared = |dimension: &str| {
        has_value(img.value().attr(dimension))
            || styles
                .iter()
                .any(|(prop, value)| prop == dimension && !value.eq_ignore_ascii_case("auto"))
    };
    declared("width") && declared("height")
}

fn is_icon(metrics: &ImageMetrics) -> bool {
    metrics.rendered_width < MIN_TRACKED_IMAGE_PX && metrics.rendered_height < MIN_TRACKED_IMAGE_PX
}

pub fn check_image_aspect_ratio(page: &Page) -> CheckResult {
    let mut findings = Vec::new();

    for img in page.select("img")? {
        if uses_object_fit(img) || is_vector(img) {
            continue;
        }
        let metrics = match page.image_metrics(img) {
            Some(m) => m,
            None => continue,
        };
        let (displayed, natural) = match aspect_ratios(metrics) {
            Some(ratios) => ratios,
            None => continue,
        };

        let deviation = (displayed - natural).abs() / natural;
        if deviation > ASPECT_RATIO_TOLERANCE {
            findings.push(
                Finding::new(
                    RuleId::ImageAspectRatio,
                    format!(
                        "Image is displayed at {}x{} but its natural size is {}x{} ({:.0}% distortion)",
                        metrics.rendered_width,
                        metrics.rendered_height,
                        metrics.natural_width,
                        metrics.natural_height,
                        deviation * 100.0
                    ),
                )
                .at(page.element_info(img)),
            );
        }
    }

    Ok(findings)
}

fn aspect_ratios(m: &ImageMetrics) -> Option<(f64, f64)> {
    let all_positive = [m.rendered_width, m.rendered_height, m.natural_width, m.natural_height]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0);
    all_positive.then(|| {
        (
            m.rendered_width / m.rendered_height,
            m.natural_width / m.natural_height,
        )
    })
}

fn uses_object_fit(img: ElementRef<'_>) -> bool {
    img.value()
        .attr("style")
        .is_some_and(|style| style_declarations(style).iter().any(|(prop, _)| prop == "object-fit"))
}

fn is_vector(img: ElementRef<'_>) -> bool {
    img.value().attr("src").is_some_and(|src| {
        let path = src.split(['?', '#']).next().unwrap_or(src);
        path.to_ascii_lowercase().ends_with(".svg")
    })
}
