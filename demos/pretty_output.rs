//! Prints one error chain in every available rendering.
//!
//! Run with: cargo run --example pretty_output

use errchain::{Fields, Leaf, ResultWrapExt, WithFields, WithMessage, fields, new, to_json, wrapf};

fn find_user(id: u64) -> Result<String, WithFields> {
    if id == 0 {
        return Err(fields!("id" => id).error("user ID cannot be zero"));
    }
    let err: Leaf = new("not found");
    Err(Fields::new().with("user_id", id).with("table", "users").wrap(err, "querying users"))
}

fn get_user_profile(id: u64) -> Result<String, WithMessage> {
    let name = find_user(id).wrap("looking up user profile")?;
    Ok(name)
}

fn handle_request(id: u64) -> Result<String, WithMessage> {
    get_user_profile(id).map_err(|e| wrapf!(e, "handling request {}", id))
}

fn main() {
    let err = handle_request(42).unwrap_err();

    println!("=== Display ===\n");
    println!("{}", err);

    println!("\n=== Verbose ===\n");
    println!("{:#}", err);

    println!("\n=== Fields ===\n");
    println!("{}", errchain::fields(&err));

    println!("\n=== JSON ===\n");
    println!("{}", to_json(&err));

    #[cfg(feature = "log")]
    {
        let record = errchain::to_log_record(&err);
        println!("\n=== log key/values ({}) ===\n", record.len());
        for (key, value) in record.as_map() {
            println!("{:>12} = {}", key, value);
        }
    }
}
