#[macro_use]
mod common;

#[cfg(test)]
mod class {
    tests! {
        inherited_method in class is OK
        "hi"
    }

    tests! {
        initializer in class is OK
        "42"
    }

    tests! {
        inherit_self in class is ERR
        "[line 1] Error at 'Foo': A class cannot inherit from itself"
    }
}
