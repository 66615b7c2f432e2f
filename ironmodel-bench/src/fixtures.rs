//! Model documents used by the benchmarks.

use std::fmt::Write as _;

/// A small document touching most codecs.
pub const SAMPLE_MODEL: &str = r#"<model xmlns:i18n="http://xml.zope.org/namespaces/i18n" xmlns="http://namespaces.plone.org/supermodel/schema" i18n:domain="bench">
  <schema>
    <field name="title" type="zope.schema.TextLine">
      <max_length>120</max_length>
      <title i18n:translate="label_title">Title</title>
    </field>
    <field name="tags" type="zope.schema.List">
      <default>
        <element>a</element>
        <element>b</element>
      </default>
      <required>False</required>
      <title>Tags</title>
      <value_type type="zope.schema.TextLine"/>
    </field>
    <field name="scores" type="zope.schema.Dict">
      <default>
        <element key="1">one</element>
        <element key="2">two</element>
      </default>
      <key_type type="zope.schema.Int"/>
      <title>Scores</title>
      <value_type type="zope.schema.TextLine"/>
    </field>
    <fieldset name="details" label="Details">
      <field name="start" type="zope.schema.Date">
        <min>2000-01-01</min>
        <title>Start</title>
      </field>
      <field name="kind" type="zope.schema.Choice">
        <title>Kind</title>
        <values>
          <element key="talk">Talk</element>
          <element key="workshop">Workshop</element>
        </values>
      </field>
    </fieldset>
  </schema>
</model>"#;

/// A document with `schemata` schemas of `fields` integer fields each.
#[must_use]
pub fn wide_model(schemata: usize, fields: usize) -> String {
    let mut xml =
        String::from("<model xmlns=\"http://namespaces.plone.org/supermodel/schema\">\n");
    for s in 0..schemata {
        let _ = writeln!(xml, "  <schema name=\"s{s}\">");
        for f in 0..fields {
            let _ = writeln!(
                xml,
                "    <field name=\"f{f}\" type=\"zope.schema.Int\"><min>0</min><default>{f}</default></field>"
            );
        }
        xml.push_str("  </schema>\n");
    }
    xml.push_str("</model>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironmodel_schema::{ModelContext, SerializeOptions, parse_model, serialize_model};

    #[test]
    fn test_sample_model_is_stable() {
        let ctx = ModelContext::default();
        let options = SerializeOptions::default();
        let model = parse_model(SAMPLE_MODEL, &ctx).unwrap();
        assert_eq!(model.schema().unwrap().fields().len(), 5);
        let first = serialize_model(&model, &ctx, &options).unwrap();
        let second = serialize_model(&parse_model(&first, &ctx).unwrap(), &ctx, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_wide_model_shape() {
        let xml = wide_model(2, 3);
        assert_eq!(xml.matches("<schema ").count(), 2);
        assert_eq!(xml.matches("<field ").count(), 6);
    }
}
