// ANCHOR: old
fn legacy() {}
