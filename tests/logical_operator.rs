#[macro_use]
mod common;

#[cfg(test)]
mod logical_operator {
    tests! {
        short_circuit in logical is OK
        "false"
        "false"
        "true"
        "true"
    }
}
