#[macro_use]
mod common;

#[cfg(test)]
mod bool {
    tests! {
        zero_is_true in bool is OK
        "\"yes\""
    }

    tests! {
        empty_string_is_true in bool is OK
        "\"yes\""
    }

    tests! {
        nil_is_false in bool is OK
        "\"no\""
    }

    tests! {
        double_negation in bool is OK
        "true"
        "false"
    }
}
