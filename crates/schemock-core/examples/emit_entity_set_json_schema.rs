use schemars::schema_for;
use schemock_core::EntitySet;

fn main() {
    let schema = schema_for!(EntitySet);
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
