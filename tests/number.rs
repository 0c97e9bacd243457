#[macro_use]
mod common;

#[cfg(test)]
mod number {
    tests! {
        literals in number is OK
        "123"
        "987654"
        "0"
        "123.456"
    }

    tests! {
        decimal_trim in number is OK
        "7"
        "1.5"
    }

    tests! {
        trailing_dot in number is ERR
        "[line 1] Error at ';': Expect property name after '.'."
    }

    tests! {
        leading_dot in number is ERR
        "[line 1] Error at '.': Expect expression."
    }

    tests! {
        big in number is OK
        "1000000000000"
    }
}
