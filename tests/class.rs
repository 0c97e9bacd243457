#[macro_use]
mod common;

#[cfg(test)]
mod class {
    tests! {
        print_class in class is OK
        "Foo"
    }

    tests! {
        print_instance in class is OK
        "Foo instance"
    }

    tests! {
        identity in class is OK
        "true"
        "true"
        "false"
    }

    tests! {
        methods in class is OK
        "\"hello\""
    }

    tests! {
        method_value in class is OK
        "\"m\""
    }
}
