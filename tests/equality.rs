#[macro_use]
mod common;

#[cfg(test)]
mod equality {
    tests! {
        totality in equality is OK
        "false"
        "true"
        "false"
    }
}
