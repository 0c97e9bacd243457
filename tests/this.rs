#[macro_use]
mod common;

#[cfg(test)]
mod this_expr {
    tests! {
        outside_class in this is ERR
        "[line 1] Error at 'this': Cannot use 'this' outside of a class."
    }

    tests! {
        in_function in this is ERR
        "[line 2] Error at 'this': Cannot use 'this' outside of a class."
    }

    tests! {
        bound in this is OK
        "Egotist instance"
    }
}
