use schemock_resolve::resolution_output_json_schema;

fn main() {
    let schema = resolution_output_json_schema();
    let json = serde_json::to_string_pretty(&schema).expect("serialize resolution json schema");
    println!("{json}");
}
