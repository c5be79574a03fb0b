//! Assertion rendering
//!
//! The synthesizer only deals in [`Assertion`] descriptors. A [`Renderer`]
//! turns one descriptor into source lines for a concrete test runtime.

use crate::assertion::Assertion;

/// Turns assertion descriptors into test-runtime source lines.
pub trait Renderer {
    /// Source lines for one assertion, without block markers.
    fn render(&self, assertion: &Assertion) -> Vec<String>;

    /// Line comment token of the target language, used for block markers.
    fn line_comment(&self) -> &str {
        "//"
    }
}

/// Postman sandbox JavaScript (`pm.*` with Ajv).
#[derive(Debug, Clone, Copy, Default)]
pub struct PostmanRenderer;

const INDENT: &str = "    ";

impl Renderer for PostmanRenderer {
    fn render(&self, assertion: &Assertion) -> Vec<String> {
        let body = match assertion {
            Assertion::ResponseSchema { schema } => schema_lines(&schema.to_string()),
            Assertion::StatusCode { codes } => status_lines(codes),
        };

        // Block scope so repeated blocks can redeclare their consts
        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push("{".to_string());
        lines.extend(body.into_iter().map(|l| format!("{INDENT}{l}")));
        lines.push("}".to_string());
        lines
    }
}

fn schema_lines(schema_literal: &str) -> Vec<String> {
    vec![
        "const Ajv = require('ajv');".to_string(),
        "const ajv = new Ajv({ allErrors: true });".to_string(),
        "ajv.addFormat('int32', {".to_string(),
        "    type: 'number',".to_string(),
        "    validate: (x) => Number.isInteger(x) && x >= -(2**31) && x <= 2**31 - 1,".to_string(),
        "});".to_string(),
        format!("const schema = {schema_literal};"),
        "const validate = ajv.compile(schema);".to_string(),
        "pm.test(\"Response schema is valid\", function () {".to_string(),
        "    const valid = validate(pm.response.json());".to_string(),
        "    if (!valid) {".to_string(),
        "        console.log('Schema validation errors:', validate.errors);".to_string(),
        "    }".to_string(),
        "    pm.expect(valid, \"Schema errors: \" + JSON.stringify(validate.errors, null, 2)).to.be.true;"
            .to_string(),
        "});".to_string(),
    ]
}

fn status_lines(codes: &[String]) -> Vec<String> {
    let exact: Vec<&str> = codes
        .iter()
        .map(String::as_str)
        .filter(|c| c.parse::<u16>().is_ok())
        .collect();
    // `2XX` style keys cover the whole class
    let expectation = if exact.len() == codes.len() {
        format!("pm.expect(pm.response.code).to.be.oneOf([{}]);", exact.join(", "))
    } else {
        "pm.expect(pm.response.code).to.be.within(200, 299);".to_string()
    };

    vec![
        format!(
            "pm.test(\"Status code is one of {}\", function () {{",
            codes.join(", ")
        ),
        format!("    {expectation}"),
        "});".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_block_snapshot() {
        let assertion = Assertion::StatusCode {
            codes: vec!["200".into(), "201".into()],
        };
        let rendered = PostmanRenderer.render(&assertion).join("\n");
        insta::assert_snapshot!(rendered, @r#"
        {
            pm.test("Status code is one of 200, 201", function () {
                pm.expect(pm.response.code).to.be.oneOf([200, 201]);
            });
        }
        "#);
    }

    #[test]
    fn status_range_key_widens_to_class() {
        let assertion = Assertion::StatusCode {
            codes: vec!["200".into(), "2XX".into()],
        };
        let rendered = PostmanRenderer.render(&assertion);
        assert!(rendered[1].contains("Status code is one of 200, 2XX"));
        assert!(rendered[2].contains("to.be.within(200, 299)"));
    }

    #[test]
    fn schema_block_embeds_literal() {
        let schema = json!({"type": "object", "properties": {"id": {"type": "integer", "format": "int32"}}});
        let rendered = PostmanRenderer.render(&Assertion::ResponseSchema {
            schema: schema.clone(),
        });

        assert_eq!(rendered.first().map(String::as_str), Some("{"));
        assert_eq!(rendered.last().map(String::as_str), Some("}"));
        assert!(rendered.iter().any(|l| l.contains("new Ajv({ allErrors: true })")));
        assert!(rendered.iter().any(|l| l.contains("ajv.addFormat('int32'")));
        assert!(rendered.iter().any(|l| l.contains("pm.test(\"Response schema is valid\"")));

        let literal = rendered
            .iter()
            .find_map(|l| l.trim().strip_prefix("const schema = "))
            .and_then(|l| l.strip_suffix(';'))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(literal).unwrap();
        assert_eq!(parsed, schema);
    }
}
