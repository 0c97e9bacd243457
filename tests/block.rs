#[macro_use]
mod common;

#[cfg(test)]
mod block {
    tests! {
        scope in block is OK
        "\"inner\""
    }

    tests! {
        empty in block is OK
    }

    tests! {
        nested in block is OK
        "3"
        "2"
        "1"
    }
}
