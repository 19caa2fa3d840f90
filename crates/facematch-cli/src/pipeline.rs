//! Sequential matching pipeline: path validation, reference loading and
//! the per-image matching loop.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use facematch_core::{distance_to_confidence, FaceEngine, KnownIdentity, Matcher};

use crate::annotate;

/// Guard: the path must name an existing regular file.
///
/// Logs at debug level on success, at error level on failure; the
/// caller treats `None` as fatal for its branch.
pub fn check_file(path: &Path) -> Option<&Path> {
    if path.is_file() {
        tracing::debug!(file = %path.display(), "file exists");
        Some(path)
    } else {
        tracing::error!(file = %path.display(), "file does not exist, check the path");
        None
    }
}

/// Guard: the path must name an existing directory.
pub fn check_directory(path: &Path) -> Option<&Path> {
    if path.is_dir() {
        tracing::debug!(directory = %path.display(), "directory exists");
        Some(path)
    } else {
        tracing::error!(directory = %path.display(), "directory does not exist, check the path");
        None
    }
}

/// Load a reference image and encode its first detected face.
///
/// A reference image without any detectable face is a user error.
pub fn load_reference<E: FaceEngine>(engine: &mut E, path: &Path) -> Result<KnownIdentity> {
    let image = image::open(path)
        .with_context(|| format!("failed to load reference image {}", path.display()))?
        .to_rgb8();
    tracing::debug!(image = %path.display(), "loading reference image");

    let faces = engine.faces(&image)?;
    let Some(first) = faces.into_iter().next() else {
        bail!("no face found in reference image {}", path.display());
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    tracing::debug!(name = %name, "reference face encoded");

    Ok(KnownIdentity {
        name,
        encoding: first.encoding,
    })
}

/// Match every face in one unknown image against the known identities.
///
/// Returns whether at least one face matched a known identity. With
/// `preview` enabled and at least one face present, an annotated copy
/// is written next to the source image.
pub fn process_image<E: FaceEngine, M: Matcher>(
    engine: &mut E,
    matcher: &M,
    known: &[KnownIdentity],
    path: &Path,
    threshold: f32,
    preview: bool,
) -> Result<bool> {
    let image = image::open(path)
        .with_context(|| format!("failed to load image {}", path.display()))?
        .to_rgb8();
    tracing::debug!(image = %path.display(), "calculating similarity for unknown image");

    let faces = engine.faces(&image)?;

    let mut canvas = preview.then(|| image.clone());
    let mut any_match = false;

    for face in &faces {
        let outcome = matcher.best_match(known, &face.encoding);

        for (identity, &distance) in known.iter().zip(outcome.distances.iter()) {
            tracing::debug!(
                known = %identity.name,
                image = %path.display(),
                distance,
                similarity = distance_to_confidence(distance, threshold),
                "distance to known face"
            );
        }

        // Label text exists only for matched faces; "Unknown" faces get
        // a rectangle without a bar.
        let label = match (&outcome.name, outcome.confidence) {
            (Some(name), Some(confidence)) => {
                any_match = true;
                tracing::info!(
                    image = %path.display(),
                    distance = outcome.distance,
                    similarity = %format!("{:.2}%", confidence * 100.0),
                    identified_as = %name,
                    "best match"
                );
                Some(format!(
                    "Identified as: {name} Similarity: {:.2}%",
                    confidence * 100.0
                ))
            }
            _ => {
                tracing::debug!(image = %path.display(), "face did not match any known identity");
                None
            }
        };

        if let Some(canvas) = canvas.as_mut() {
            annotate::annotate_face(canvas, &face.location, label.as_deref());
        }
    }

    if let Some(canvas) = canvas.as_ref() {
        if !faces.is_empty() {
            let out = preview_path(path);
            canvas
                .save(&out)
                .with_context(|| format!("failed to write preview {}", out.display()))?;
            tracing::info!(preview = %out.display(), "annotated preview written");
        }
    }

    Ok(any_match)
}

/// Sibling path for the annotated preview copy.
fn preview_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "preview".to_string());
    path.with_file_name(format!("{stem}_annotated.jpg"))
}
