//! Example that loads a model, prints its schemas and writes it back.
//!
//! Run with: `cargo run --example roundtrip [-- path/to/model.xml]`

use ironmodel::prelude::*;
use std::sync::Arc;

const SAMPLE: &str = r#"<model xmlns="http://namespaces.plone.org/supermodel/schema"
       xmlns:i18n="http://xml.zope.org/namespaces/i18n"
       xmlns:marshal="http://namespaces.plone.org/supermodel/marshal"
       i18n:domain="events">
  <schema name="event" based-on="demo.IContent">
    <invariant>demo.checks.dates</invariant>
    <field name="title" type="zope.schema.TextLine">
      <title i18n:translate="label_title">Title</title>
    </field>
    <field name="body" type="zope.schema.Text" marshal:primary="true">
      <required>False</required>
      <title i18n:translate="">Body</title>
    </field>
    <fieldset name="dates" label="Dates">
      <field name="start" type="zope.schema.Date">
        <title>Start</title>
      </field>
      <field name="end" type="zope.schema.Date">
        <required>False</required>
        <title>End</title>
      </field>
    </fieldset>
  </schema>
</model>"#;

fn symbols() -> SymbolTable {
    let mut content = Schema::new("IContent", "demo");
    content.insert_field(Field::new(FieldType::TextLine).with_name("title"));

    let mut symbols = SymbolTable::new();
    symbols.register_schema(Arc::new(content));
    symbols.register_invariant(Invariant::new("demo.checks.dates", |data| {
        match (data.get("start"), data.get("end")) {
            (Some(start), Some(end)) if end < start => Err("end is before start".to_string()),
            _ => Ok(()),
        }
    }));
    symbols
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let context = ModelContext::builder()
        .resolver(symbols())
        .field_handler(ironmodel::schema::PrimaryFieldHandler)
        .build();
    let loader = ModelLoader::new(context);

    let model = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading {}", path);
            loader.load_file(&path, DEFAULT_POLICY, false)?.as_ref().clone()
        }
        None => loader.load_string(SAMPLE, DEFAULT_POLICY)?,
    };

    for (name, schema) in model.iter() {
        let label = if name.is_empty() { "<default>" } else { name };
        println!("Schema {} ({})", label, schema.identifier());
        for field in schema.fields_in_order() {
            println!("  {:<12} {}", field.name(), field.type_identifier());
        }
        for fieldset in schema.sorted_fieldsets() {
            println!("  [{}] {}", fieldset.name, fieldset.fields.join(", "));
        }
        if let Some(primary) = schema.primary_field() {
            println!("  primary: {}", primary.name());
        }
    }

    println!();
    println!("{}", loader.serialize_model(&model)?);
    Ok(())
}
