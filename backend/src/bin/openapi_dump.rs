//! Print the OpenAPI document as JSON.

use husky_helpers::doc::ApiDoc;
use utoipa::OpenApi;

#[expect(clippy::print_stdout, reason = "the document is written to stdout")]
fn main() -> Result<(), serde_json::Error> {
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
