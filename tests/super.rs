#[macro_use]
mod common;

#[cfg(test)]
mod super_expr {
    tests! {
        call_super in super is OK
        "\"A\""
        "\"B\""
    }

    tests! {
        through_chain in super is OK
        "\"A.m\""
    }

    tests! {
        undefined_method in super is RUNTIME_ERR
        "Undefined method 'missing'."
        "[line 3]"
    }

    tests! {
        outside_class in super is ERR
        "[line 1] Error at 'super': Cannot use 'super' outside of a class."
    }

    tests! {
        no_superclass in super is ERR
        "[line 2] Error at 'super': Cannot use 'super' in a class with no superclass."
    }
}
