#[macro_use]
mod common;

#[cfg(test)]
mod scope {
    tests! {
        shadowing in scope is OK
        "2"
        "1"
    }
}
