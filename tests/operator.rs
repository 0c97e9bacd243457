#[macro_use]
mod common;

#[cfg(test)]
mod operator {
    tests! {
        add in operator is OK
        "579"
        "\"string\""
    }

    tests! {
        subtract in operator is OK
        "1"
        "0"
    }

    tests! {
        multiply_divide in operator is OK
        "15"
        "3.75"
    }

    tests! {
        precedence in operator is OK
        "14"
        "20"
        "2"
        "true"
    }

    tests! {
        comparison in operator is OK
        "true"
        "true"
        "false"
        "true"
    }

    tests! {
        equality in operator is OK
        "true"
        "false"
        "true"
        "false"
        "true"
        "false"
        "true"
        "false"
        "false"
        "true"
    }

    tests! {
        negate in operator is OK
        "3"
        "false"
        "true"
        "false"
    }

    tests! {
        divide_by_zero in operator is OK
        "inf"
        "NaN"
    }

    tests! {
        add_mismatch in operator is RUNTIME_ERR
        "Operands must be two numbers or two strings."
        "[line 1]"
    }

    tests! {
        subtract_string in operator is RUNTIME_ERR
        "Operand must be a number."
        "[line 1]"
    }

    tests! {
        compare_string in operator is RUNTIME_ERR
        "Operand must be a number."
        "[line 1]"
    }

    tests! {
        negate_string in operator is RUNTIME_ERR
        "Operand must be a number."
        "[line 1]"
    }
}
