use partplan_layout::DiskState;
use schemars::schema_for;
use serde as _;
use thiserror as _;

fn main() {
    let schema = schema_for!(DiskState);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
