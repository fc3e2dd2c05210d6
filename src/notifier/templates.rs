//! Fixed HTML templates for the three notification emails.

use crate::catalog::ReleaseDocument;

/// Subject and HTML body for the "submission received" email.
pub fn received_email(submission_id: &str) -> (String, String) {
    let subject = format!("Submission received: {}", submission_id);
    let html = format!(
        "<h2>Submission received</h2>\
         <p>Submission <strong>{}</strong> has been received and is being processed.</p>",
        escape(submission_id)
    );
    (subject, html)
}

/// Subject and HTML body for the "processing complete" email, including
/// the track listing with degraded tracks marked.
pub fn complete_email(release: &ReleaseDocument) -> (String, String) {
    let subject = format!(
        "Processing complete: {} - {}",
        release.artist, release.title
    );

    let mut listing = String::new();
    for track in &release.tracks {
        let note = if track.is_degraded() {
            " (processing failed)"
        } else {
            ""
        };
        listing.push_str(&format!(
            "<li>{:02}. {}{}</li>",
            track.track_number,
            escape(&track.title),
            note
        ));
    }

    let html = format!(
        "<h2>Processing complete</h2>\
         <p><strong>{}</strong> by <strong>{}</strong> is now pending approval \
         (release id <code>{}</code>).</p>\
         <ol style=\"list-style: none; padding: 0\">{}</ol>",
        escape(&release.title),
        escape(&release.artist),
        escape(&release.id),
        listing
    );

    (subject, html)
}

/// Subject and HTML body for the "processing failed" email.
pub fn failed_email(submission_id: &str, error: &str) -> (String, String) {
    let subject = format!("Processing failed: {}", submission_id);
    let html = format!(
        "<h2>Processing failed</h2>\
         <p>Submission <strong>{}</strong> could not be processed. The source \
         files were left in place for inspection and retry.</p>\
         <pre>{}</pre>",
        escape(submission_id),
        escape(error)
    );
    (subject, html)
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
