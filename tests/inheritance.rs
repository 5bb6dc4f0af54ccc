#[macro_use]
mod common;

#[cfg(test)]
mod inheritance {
    tests! {
        super_call in inheritance is OK
        "A"
        "B"
    }
}
