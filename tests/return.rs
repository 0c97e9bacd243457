#[macro_use]
mod common;

#[cfg(test)]
mod return_stmt {
    tests! {
        top_level in return is ERR
        "[line 1] Error at 'return': Cannot return from top-level code."
    }

    tests! {
        after_else in return is OK
        "\"yes\""
    }

    tests! {
        from_nested_blocks in return is OK
        "\"deep\""
    }

    tests! {
        nil_return in return is OK
        "<nil>"
    }
}
