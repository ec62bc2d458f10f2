mod regeneration_tests;
