//! Test fixtures shared with loupe-inspect and the demo binary.

use crate::page::Page;
use crate::value::{ElementId, FunctionValue, Value};

/// A small inspectable page: an app component wrapping a profile component,
/// with plain elements in between and the profile pre-selected.
pub struct SampleFixture {
    /// The page, ready to serve.
    pub page: Page,
    /// Root app component element.
    pub app: ElementId,
    /// Profile component element owning `person`; selected at build time.
    pub profile: ElementId,
    /// The person record the profile owns.
    pub person: Value,
    /// The person's hobbies collection.
    pub hobbies: Value,
}

/// Build the sample page.
#[must_use]
pub fn sample_page() -> SampleFixture {
    let mut page = Page::new();
    let store = page.store();

    let hobbies = store.new_seq("Array");
    store.fill_seq(hobbies, vec![Value::from("reading"), Value::from("sailing")]);
    let hobbies = Value::Seq(hobbies);

    let person = store.new_record("Person");
    store.init_field(person, "name", Value::from("Astrid"));
    store.init_field(person, "age", Value::from(34));
    store.init_field(person, "hobbies", hobbies.clone());
    store.init_field(
        person,
        "greet",
        Value::Function(FunctionValue {
            name: "greet".into(),
            source: "function greet() { return \"hi \" + this.name; }".into(),
        }),
    );
    store.init_field(person, "_cid", Value::from("c-1"));
    let person = Value::Record(person);

    let app_model = store.new_record("App");
    store.init_field(app_model, "title", Value::from("Demo"));

    let app = page.create_component("div", Value::Record(app_model));
    let header = page.create_element("header");
    let profile = page.create_component("section", person.clone());
    let paragraph = page.create_element("p");
    page.append_child(app, header);
    page.append_child(header, profile);
    page.append_child(profile, paragraph);
    page.add_root(app);
    page.set_selected(Some(profile));

    SampleFixture {
        page,
        app,
        profile,
        person,
        hobbies,
    }
}
