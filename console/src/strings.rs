macro_rules! define_strings {
    (
        $($name:ident = $value:literal);*$(;)?
    ) => {
        $(
            pub const $name: &str = $value;
        )*
    };
}

pub mod analysis {
    define_strings! {
        INPUT =
            "Path to the sheet. The first row holds the headers; a header \
            followed by blank or `Unnamed` cells is expanded into bin columns \
            (`<name> bin 1`, `<name> bin 2`, ...). `.tsv`/`.tab` files are read \
            as tab separated, everything else as comma separated.";
        PROPERTY =
            "Column to analyse. For ANOVA this is the name of a bin group; its \
            `Total <name>` (or `Average <name>`) column selects the rows.";
        FILTER =
            "Equality filter `column=value` selecting the first dataset. May be \
            given several times; all filters must hold.";
        FILTER_B =
            "Equality filter `column=value` selecting the second dataset. For \
            two-way ANOVA the first column whose value differs between the two \
            datasets becomes the second factor.";
        OUTPUT =
            "Write the report to this path instead of stdout. ANOVA tables are \
            written as CSV when the path ends in `.csv`, everything else as JSON.";
        PLOT_OUTPUT =
            "Write the interaction plot request (JSON) of a two-way ANOVA to \
            this path.";
        ALPHA =
            "Significance level of Grubbs' outlier test.";
        MIN_SAMPLES =
            "Minimum number of samples per dataset left after outlier removal.";
    }
}

pub mod utils {
    define_strings! {
        VERBOSE =
            "Enable verbose logging. Repeat for more detail.";
        THREADS =
            "Number of threads used by polars.";
    }
}
