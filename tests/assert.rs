#[macro_use]
mod common;

#[cfg(test)]
mod assert {
    tests! {
        success in assert is OK
        "ok"
    }

    tests! {
        failure in assert is ERR
        "Assert Failed.\n[line 1]"
    }
}
